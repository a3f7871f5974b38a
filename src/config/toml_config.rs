use crate::adapters::backend::{BackendConfig, ConfiguredBackend};
use crate::core::collector::{BackendRegistry, DEFAULT_INTERNAL_MODELS};
use crate::core::router::{RouteConfig, RouteMatch, RouteTable};
use crate::domain::billing::Service;
use crate::domain::model::Server;
use crate::utils::error::{OrchestraError, Result};
use crate::utils::validation::{
    validate_known_name, validate_non_empty_string, validate_range, validate_unique_names, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestraConfig {
    #[serde(default)]
    pub orchestration: OrchestrationSettings,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub billing: BillingSettings,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationSettings {
    #[serde(default = "default_admin_path_prefix")]
    pub admin_path_prefix: String,
    #[serde(default = "default_internal_models")]
    pub internal_models: Vec<String>,
    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            admin_path_prefix: default_admin_path_prefix(),
            internal_models: default_internal_models(),
            ssh_user: default_ssh_user(),
        }
    }
}

fn default_admin_path_prefix() -> String {
    "/admin/".to_string()
}

fn default_internal_models() -> Vec<String> {
    DEFAULT_INTERNAL_MODELS.iter().map(|m| m.to_string()).collect()
}

fn default_ssh_user() -> String {
    "root".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSettings {
    #[serde(default = "default_annual_billing_month")]
    pub annual_billing_month: u32,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            annual_billing_month: default_annual_billing_month(),
        }
    }
}

fn default_annual_billing_month() -> u32 {
    1
}

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"))
}

/// 替換環境變數 (例如 ${SSH_USER}); unknown variables are left untouched.
pub(crate) fn substitute_env_vars(content: &str) -> String {
    env_var_regex()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

impl OrchestraConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(OrchestraError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| OrchestraError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_unique_names("servers.name", self.servers.iter().map(|s| s.name.as_str()))?;
        validate_unique_names("backends.name", self.backends.iter().map(|b| b.name.as_str()))?;
        validate_unique_names("services.name", self.services.iter().map(|s| s.name.as_str()))?;

        for server in &self.servers {
            validate_non_empty_string("servers.address", &server.address)?;
        }
        for backend in &self.backends {
            validate_non_empty_string("backends.name", &backend.name)?;
            validate_non_empty_string("backends.model", &backend.model)?;
        }

        let server_names: Vec<&str> = self.servers.iter().map(|s| s.name.as_str()).collect();
        let backend_names: Vec<&str> = self.backends.iter().map(|b| b.name.as_str()).collect();
        for route in &self.routes {
            validate_known_name("routes.backend", &route.backend, &backend_names)?;
            validate_known_name("routes.host", &route.host, &server_names)?;
            RouteMatch::parse(&route.match_expr)?;
        }

        validate_range("billing.annual_billing_month", self.billing.annual_billing_month, 1, 12)?;
        Ok(())
    }

    pub fn build_registry(&self) -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        for backend in &self.backends {
            registry.register(Arc::new(ConfiguredBackend::new(backend.clone())));
        }
        registry
    }

    pub fn build_router(&self) -> Result<RouteTable> {
        RouteTable::from_config(&self.routes, &self.servers)
    }

    pub fn service(&self, name: &str) -> Result<&Service> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| OrchestraError::MissingConfigError {
                field: format!("services.{}", name),
            })
    }
}

impl Validate for OrchestraConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[orchestration]
admin_path_prefix = "/admin/"

[[servers]]
name = "web"
address = "10.0.0.10"

[[backends]]
name = "system-user"
model = "users.User"
ignore_fields = ["last_login"]
save = ["useradd {username}"]
delete = ["userdel {username}"]

[[backends.related]]
model = "accounts.Account"
relation = "users"
many = true

[[routes]]
backend = "system-user"
host = "web"
match = "is_active == True"

[billing]
annual_billing_month = 6

[[services]]
name = "ftp"
description = "FTP Account"
billing_period = "annual"
billing_point = "fixed_date"
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = OrchestraConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.servers[0].address, "10.0.0.10");
        assert_eq!(config.backends[0].related[0].relation, "users");
        assert_eq!(config.routes[0].match_expr, "is_active == True");
        assert_eq!(config.billing.annual_billing_month, 6);
        assert_eq!(config.orchestration.ssh_user, "root");
        assert!(config.validate().is_ok());
        assert_eq!(config.build_registry().len(), 1);
        assert!(config.service("ftp").is_ok());
        assert!(config.service("dns").is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ORCHESTRA_TEST_WEB_ADDRESS", "192.168.1.2");

        let config = OrchestraConfig::from_toml_str(
            r#"
[[servers]]
name = "web"
address = "${ORCHESTRA_TEST_WEB_ADDRESS}"
"#,
        )
        .unwrap();
        assert_eq!(config.servers[0].address, "192.168.1.2");

        std::env::remove_var("ORCHESTRA_TEST_WEB_ADDRESS");
    }

    #[test]
    fn test_config_validation() {
        let unknown_host = BASIC.replace("host = \"web\"", "host = \"mail\"");
        let config = OrchestraConfig::from_toml_str(&unknown_host).unwrap();
        assert!(config.validate().is_err());

        let bad_match = BASIC.replace("is_active == True", "is_active ~ True");
        let config = OrchestraConfig::from_toml_str(&bad_match).unwrap();
        assert!(config.validate().is_err());

        let bad_month = BASIC.replace("annual_billing_month = 6", "annual_billing_month = 13");
        let config = OrchestraConfig::from_toml_str(&bad_month).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = OrchestraConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.backends[0].name, "system-user");
        assert!(config.build_router().is_ok());
    }
}
