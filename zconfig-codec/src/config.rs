use std::fmt;
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ConfigError;

/// Default bound on message nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Deepest nesting the typed path accepts. prost stops at 100 recursion levels
/// and counts the fields of the innermost level as one more.
pub const MAX_SUPPORTED_DEPTH: usize = 99;
/// Default bound on the size of a top-level message (4 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// What the decoder does with fields that are not in the schema table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Consume and drop them; enough for a terminal consumer
    #[default]
    Discard,
    /// Keep them on schema-driven records and re-emit them on encode,
    /// for forwarding proxies that must not lose newer fields
    Retain,
}

impl fmt::Display for UnknownFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownFieldPolicy::Discard => write!(f, "discard"),
            UnknownFieldPolicy::Retain => write!(f, "retain"),
        }
    }
}

impl UnknownFieldPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "discard" | "drop" => Some(UnknownFieldPolicy::Discard),
            "retain" | "keep" | "preserve" => Some(UnknownFieldPolicy::Retain),
            _ => None,
        }
    }
}

/// configuration settings loaded from the config file, every key optional
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadCodecConfig {
    /// Unknown field handling, defaults to discard
    pub unknown_fields: Option<UnknownFieldPolicy>,
    /// Maximum nesting depth of embedded messages
    pub max_depth: Option<usize>,
    /// Maximum size in bytes of a top-level message
    pub max_message_size: Option<usize>,
}

/// Resource bounds and unknown-field handling used by a `Codec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodecConfig {
    pub unknown_fields: UnknownFieldPolicy,
    pub max_depth: usize,
    pub max_message_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            unknown_fields: UnknownFieldPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl TryFrom<LoadCodecConfig> for CodecConfig {
    type Error = ConfigError;

    fn try_from(config: LoadCodecConfig) -> Result<Self, Self::Error> {
        let max_depth = config.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if max_depth == 0 || max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be between 1 and {MAX_SUPPORTED_DEPTH}, got {max_depth}"
            )));
        }

        let max_message_size = config.max_message_size.unwrap_or(DEFAULT_MAX_MESSAGE_SIZE);
        if max_message_size == 0 {
            return Err(ConfigError::Invalid(
                "max_message_size must be greater than zero".to_string(),
            ));
        }

        Ok(CodecConfig {
            unknown_fields: config.unknown_fields.unwrap_or_default(),
            max_depth,
            max_message_size,
        })
    }
}

impl CodecConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let load_config: LoadCodecConfig = serde_yaml::from_str(content)?;
        load_config.try_into()
    }

    /// Load the configuration from the specified YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            "loaded codec configuration from {}: unknown_fields={}, max_depth={}, \
             max_message_size={}",
            path.display(),
            config.unknown_fields,
            config.max_depth,
            config.max_message_size
        );
        Ok(config)
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Values outside `1..=MAX_SUPPORTED_DEPTH` are clamped into that range.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.clamp(1, MAX_SUPPORTED_DEPTH);
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = CodecConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.unknown_fields, UnknownFieldPolicy::Discard);
    }

    #[test]
    fn test_yaml_overrides() {
        let config = CodecConfig::from_yaml_str(
            "unknown_fields: retain\nmax_depth: 16\nmax_message_size: 1024\n",
        )
        .unwrap();
        assert_eq!(config.unknown_fields, UnknownFieldPolicy::Retain);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_message_size, 1024);
    }

    #[test]
    fn test_invalid_bounds_are_rejected() {
        assert!(matches!(
            CodecConfig::from_yaml_str("max_depth: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CodecConfig::from_yaml_str("max_depth: 100"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CodecConfig::from_yaml_str("max_message_size: 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            CodecConfig::from_yaml_str("max_nesting: 3"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_policy_from_str_case_insensitive() {
        assert_eq!(
            UnknownFieldPolicy::from_str("RETAIN"),
            Some(UnknownFieldPolicy::Retain)
        );
        assert_eq!(
            UnknownFieldPolicy::from_str("drop"),
            Some(UnknownFieldPolicy::Discard)
        );
        assert_eq!(UnknownFieldPolicy::from_str("invalid"), None);
        assert_eq!(UnknownFieldPolicy::Retain.to_string(), "retain");
    }

    #[test]
    fn test_builder_clamps_depth() {
        let config = CodecConfig::default().with_max_depth(0);
        assert_eq!(config.max_depth, 1);
        let config = CodecConfig::default().with_max_depth(1000);
        assert_eq!(config.max_depth, MAX_SUPPORTED_DEPTH);
    }
}
