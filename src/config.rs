use crate::error::{Error, Result};
use crate::metadata::RequiredPolicy;
use crate::schema_compiler::DEFAULT_MAX_DEPTH;
use log::debug;
use std::env;
use std::path::PathBuf;

/// Engine configuration.
///
/// Static analysis only runs when it is enabled, the process is not flagged as
/// production, and source files can actually be found under `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Working tree searched by the static resolver and the type locator
    pub root: PathBuf,
    pub static_analysis: bool,
    pub production: bool,
    /// Directory of pre-generated schema files
    pub schema_dir: Option<PathBuf>,
    /// Refuse to start without a usable `schema_dir`
    pub require_stored_schemas: bool,
    pub max_depth: usize,
    pub required_policy: RequiredPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            static_analysis: true,
            production: false,
            schema_dir: None,
            require_stored_schemas: false,
            max_depth: DEFAULT_MAX_DEPTH,
            required_policy: RequiredPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from `HANDLER_SCHEMA_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(root) = lookup("HANDLER_SCHEMA_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(flag) = lookup("HANDLER_SCHEMA_STATIC") {
            config.static_analysis = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        if let Some(environment) = lookup("HANDLER_SCHEMA_ENV").or_else(|| lookup("APP_ENV")) {
            config.production = matches!(
                environment.trim().to_ascii_lowercase().as_str(),
                "production" | "prod"
            );
        }
        if let Some(dir) = lookup("HANDLER_SCHEMA_DIR") {
            if !dir.trim().is_empty() {
                config.schema_dir = Some(PathBuf::from(dir));
            }
        }

        debug!("Loaded engine configuration from environment: {:?}", config);
        config
    }

    pub fn with_static_analysis(mut self, enabled: bool) -> Self {
        self.static_analysis = enabled;
        self
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    pub fn with_required_stored_schemas(mut self, required: bool) -> Self {
        self.require_stored_schemas = required;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_required_policy(mut self, policy: RequiredPolicy) -> Self {
        self.required_policy = policy;
        self
    }

    /// Whether the static stage may run at all (before probing for sources)
    pub fn static_enabled(&self) -> bool {
        self.static_analysis && !self.production
    }

    /// Reject configurations that cannot work, before any compilation starts
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig(
                "max depth must be at least 1".to_string(),
            ));
        }
        match &self.schema_dir {
            Some(dir) if !dir.is_dir() => Err(Error::InvalidConfig(format!(
                "schema directory {} does not exist or is not a directory",
                dir.display()
            ))),
            None if self.require_stored_schemas => Err(Error::InvalidConfig(
                "stored schemas are required but no schema directory is configured".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.static_analysis);
        assert!(!config.production);
        assert_eq!(config.max_depth, 10);
        assert!(config.static_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("HANDLER_SCHEMA_ROOT", "/srv/app"),
            ("HANDLER_SCHEMA_STATIC", "off"),
            ("APP_ENV", "Production"),
            ("HANDLER_SCHEMA_DIR", "/srv/schemas"),
        ]));
        assert_eq!(config.root, PathBuf::from("/srv/app"));
        assert!(!config.static_analysis);
        assert!(config.production);
        assert_eq!(config.schema_dir, Some(PathBuf::from("/srv/schemas")));
    }

    #[test]
    fn test_specific_env_var_wins() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("HANDLER_SCHEMA_ENV", "development"),
            ("APP_ENV", "prod"),
        ]));
        assert!(!config.production);
        assert!(config.static_enabled());
    }

    #[test]
    fn test_production_disables_static() {
        let config = EngineConfig::default().with_production(true);
        assert!(!config.static_enabled());
    }

    #[test]
    fn test_validate_schema_dir() {
        let missing = EngineConfig::default().with_schema_dir("/definitely/not/here");
        assert!(matches!(missing.validate(), Err(Error::InvalidConfig(_))));

        let required = EngineConfig::default().with_required_stored_schemas(true);
        assert!(matches!(required.validate(), Err(Error::InvalidConfig(_))));

        let temp_dir = TempDir::new().unwrap();
        let ok = EngineConfig::default()
            .with_schema_dir(temp_dir.path())
            .with_required_stored_schemas(true);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = EngineConfig::default().with_max_depth(0);
        assert!(config.validate().is_err());
    }
}
