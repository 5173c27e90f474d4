//! School identity loaded from a YAML file.
//!
//! The file lives at `school_config.yaml` in the working directory unless
//! `SCHOOL_CONFIG_PATH` points elsewhere. Environment variables prefixed with
//! `SCHOOL_` override top-level keys (`SCHOOL_NAME`, `SCHOOL_PHONE`, ...).
//! Unknown keys are ignored.
//!
//! ```yaml
//! name: Riverside High School
//! address: 12 River Road
//! phone: "+1 555 0100"
//! email: office@riverside.example
//! attributes:
//!   - key: founded
//!     value: 1962
//!     type: number
//!   - key: motto
//!     value: Learn by doing
//! ```

use std::env;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ConfigError;

pub const DEFAULT_SCHOOL_CONFIG_PATH: &str = "school_config.yaml";

/// Top-level keys taken verbatim from `SCHOOL_*` variables.
const TEXT_KEYS: [&str; 5] = ["name", "address", "phone", "email", "description"];

/// Declared type of a free-form school attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchoolAttribute {
    pub key: String,
    /// Any JSON value except `null`
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    #[serde(default, rename = "type")]
    pub attribute_type: AttributeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchoolConfig {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Option<Vec<SchoolAttribute>>,
}

impl SchoolConfig {
    /// Load from the path in `SCHOOL_CONFIG_PATH`, or the default file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// YAML file first, `SCHOOL_*` environment variables on top.
    ///
    /// Text keys bypass figment's value parsing so `SCHOOL_PHONE=+14155550100`
    /// stays a string instead of becoming an integer.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        let mut figment = Figment::new().merge(Yaml::file(path.as_ref())).merge(
            Env::prefixed("SCHOOL_")
                .ignore(&["CONFIG_PATH", "NAME", "ADDRESS", "PHONE", "EMAIL", "DESCRIPTION"]),
        );

        for key in TEXT_KEYS {
            if let Ok(value) = env::var(format!("SCHOOL_{}", key.to_uppercase())) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        figment
    }

    pub fn config_path() -> PathBuf {
        env::var("SCHOOL_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCHOOL_CONFIG_PATH))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::NotConfigured {
                field: "name".to_string(),
            });
        }

        for attribute in self.attributes.iter().flatten() {
            if attribute.key.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "attributes.key".to_string(),
                    reason: "attribute key cannot be blank".to_string(),
                });
            }
            if attribute.value.is_null() {
                return Err(ConfigError::InvalidValue {
                    field: format!("attributes.{}", attribute.key),
                    reason: "attribute value cannot be null".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn attribute(&self, key: &str) -> Option<&SchoolAttribute> {
        self.attributes.iter().flatten().find(|a| a.key == key)
    }
}
