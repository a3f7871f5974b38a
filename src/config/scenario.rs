use crate::config::toml_config::substitute_env_vars;
use crate::domain::billing::Order;
use crate::domain::model::{Change, Request, Response};
use crate::utils::error::{OrchestraError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = std::fs::read_to_string(&path).map_err(OrchestraError::IoError)?;
    parse_toml(&content)
}

fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(&substitute_env_vars(content)).map_err(|e| OrchestraError::ConfigValidationError {
        field: "toml_parsing".to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    #[serde(default = "default_status")]
    pub status: u16,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_status() -> u16 {
    200
}

/// One request worth of model changes, replayed through the middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub request: ScenarioRequest,
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_toml(path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }

    pub fn request(&self) -> Request {
        Request::new(self.request.method.clone(), self.request.path.clone())
    }

    pub fn response(&self) -> Response {
        Response::new(self.request.status)
    }
}

impl Validate for Scenario {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("request.path", &self.request.path)?;
        validate_range("request.status", self.request.status, 100, 599)?;
        Ok(())
    }
}

/// Orders of one service, input of the chunking command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl OrderBook {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_toml(path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }
}

impl Validate for OrderBook {
    fn validate(&self) -> Result<()> {
        for order in &self.orders {
            if let Some(bu) = order.billed_until {
                if bu < order.registered_on {
                    return Err(OrchestraError::InvalidConfigValueError {
                        field: format!("orders.{}.billed_until", order.id),
                        value: bu.to_string(),
                        reason: "billed_until is before registered_on".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
