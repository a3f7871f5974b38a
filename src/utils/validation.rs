use crate::utils::error::{OrchestraError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OrchestraError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(OrchestraError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 名稱必須唯一 (servers, backends, services)
pub fn validate_unique_names<'a, I>(field_name: &str, names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(OrchestraError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.to_string(),
                reason: "Duplicated name".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_known_name(field_name: &str, value: &str, known: &[&str]) -> Result<()> {
    if !known.contains(&value) {
        return Err(OrchestraError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Unknown name. Known names: {}", known.join(", ")),
        });
    }
    Ok(())
}
