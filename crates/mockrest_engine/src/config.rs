use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mockrest_base::{ErrorKind, MockApiError, MockApiResult, ResultExt};

/// Runtime configuration of an in-memory backend.
///
/// Field names use the camelCase spelling clients send to the `commands/config` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    /// Match filter patterns case-sensitively.
    pub case_sensitive_search: bool,
    /// Simulated latency in milliseconds.
    pub delay: u64,
    /// Answer 404 when deleting an id that does not exist.
    #[serde(rename = "delete404")]
    pub delete_404: bool,
    /// Forward requests for unknown collections to the pass-through backend.
    pub pass_thru_unknown_url: bool,
    /// Host the simulated API lives on.
    pub host: String,
    /// Path prefix stripped from same-host URLs before addressing.
    pub root_path: String,
    /// Derive the caller's user id from a bearer token.
    pub use_jwt: bool,
    /// Query parameter name carrying the number of records to skip.
    pub skip: Option<String>,
    /// Query parameter name carrying the page size.
    pub limit: Option<String>,
    /// Query parameter name carrying the `field=pattern` filter list.
    pub filter: Option<String>,
    /// Field that a bare filter pattern (one without `field=`) is matched against.
    pub filter_field: Option<String>,
    pub default_response_options: DefaultResponseOptions,
}

/// Fields merged into every response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultResponseOptions {
    /// Headers added unless the response already sets them.
    pub headers: BTreeMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            case_sensitive_search: false,
            delay: 500,
            delete_404: false,
            pass_thru_unknown_url: false,
            host: "localhost".to_string(),
            root_path: "/".to_string(),
            use_jwt: false,
            skip: None,
            limit: None,
            filter: None,
            filter_field: None,
            default_response_options: DefaultResponseOptions::default(),
        }
    }
}

impl BackendConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> MockApiResult<Self> {
        toml::from_str(text).map_err(|e| bad_configuration(e.to_string()))
    }

    /// Render the configuration as the JSON object returned by `commands/config`.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Merge a partial configuration object into this one, field by field.
    ///
    /// Unknown keys are ignored. On a type mismatch the configuration is left unchanged.
    pub fn merge_json(&mut self, partial: Value) -> MockApiResult<()> {
        let updates = match partial {
            Value::Object(updates) => updates,
            other => {
                return Err(bad_configuration(format!(
                    "expected a configuration object, got {}",
                    other
                )));
            }
        };
        let Value::Object(mut current) = self.to_json() else {
            return Err(bad_configuration("configuration is not an object"));
        };
        for (key, value) in updates {
            if let Some(slot) = current.get_mut(&key) {
                *slot = value;
            }
        }
        *self = serde_json::from_value(Value::Object(current))
            .map_err(|e| bad_configuration(e.to_string()))?;
        Ok(())
    }
}

/// Load a backend configuration from a TOML file.
pub fn load_config(path: &Path) -> MockApiResult<BackendConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        bad_configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    BackendConfig::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
}

fn bad_configuration(message: impl Into<String>) -> Box<MockApiError> {
    Box::new(MockApiError::new(ErrorKind::BadConfiguration {
        message: message.into(),
    }))
}
