//! Reader configuration.
//!
//! Loaded from YAML; every field has a default, so an empty document is valid.
//!
//! ```yaml
//! flatten: passthrough   # nested | passthrough | flat
//! splice: [form, literal]
//! pretty: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::normalize::FlattenPolicy;
use crate::ParceraError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Placement of child rules in the hiccup output.
    pub flatten: FlattenPolicy,
    /// Extra parser rules to splice under the `passthrough` policy.
    pub splice: Vec<String>,
    /// Indent JSON output.
    pub pretty: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            flatten: FlattenPolicy::default(),
            splice: Vec::new(),
            pretty: true,
        }
    }
}

impl ReaderConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ParceraError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ParceraError::Config {
            message: format!("invalid reader configuration: {}", e),
            ctx: crate::ErrorContext::none(),
            source: Some(Box::new(e)),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParceraError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ParceraError::io(path.display(), e))?;
        log::debug!("loaded reader configuration from {}", path.display());
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String, ParceraError> {
        serde_yaml::to_string(self).map_err(|e| ParceraError::Config {
            message: format!("cannot serialize reader configuration: {}", e),
            ctx: crate::ErrorContext::none(),
            source: Some(Box::new(e)),
        })
    }
}
