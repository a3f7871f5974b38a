use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestraError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid route match expression '{expression}': {reason}")]
    RouteMatchError { expression: String, reason: String },

    #[error("Script rendering failed for backend '{backend}': {message}")]
    RenderError { backend: String, message: String },

    #[error("Script execution failed on '{server}': {message}")]
    ExecutionError { server: String, message: String },

    #[error("Billing error: {message}")]
    BillingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Routing,
    Execution,
    Billing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OrchestraError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestraError::ConfigError { .. }
            | OrchestraError::ConfigValidationError { .. }
            | OrchestraError::InvalidConfigValueError { .. }
            | OrchestraError::MissingConfigError { .. } => ErrorCategory::Configuration,
            OrchestraError::RouteMatchError { .. } => ErrorCategory::Routing,
            OrchestraError::RenderError { .. } | OrchestraError::ExecutionError { .. } => {
                ErrorCategory::Execution
            }
            OrchestraError::BillingError { .. } => ErrorCategory::Billing,
            OrchestraError::IoError(_) | OrchestraError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Routing => ErrorSeverity::High,
            ErrorCategory::Execution => ErrorSeverity::Medium,
            ErrorCategory::Billing => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            OrchestraError::IoError(_) => "Check that the file exists and is readable",
            OrchestraError::SerializationError(_) => "Check the JSON payload for syntax errors",
            OrchestraError::ConfigError { .. } | OrchestraError::ConfigValidationError { .. } => {
                "Review the TOML configuration file syntax and section names"
            }
            OrchestraError::InvalidConfigValueError { .. } => {
                "Fix the reported configuration value and run again"
            }
            OrchestraError::MissingConfigError { .. } => "Add the missing configuration entry",
            OrchestraError::RouteMatchError { .. } => {
                "Use True, False or clauses like `field == 'value'` joined by `and`"
            }
            OrchestraError::RenderError { .. } => {
                "Make sure every {placeholder} in the backend templates is an instance field"
            }
            OrchestraError::ExecutionError { .. } => "Check connectivity with the target server",
            OrchestraError::BillingError { .. } => "Check the order dates and service policy",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Routing => format!("Routing problem: {}", self),
            ErrorCategory::Execution => format!("Backend execution problem: {}", self),
            ErrorCategory::Billing => format!("Billing problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestraError>;
