//! `praxis.toml` configuration and engine assembly.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! request_schema = "request_schema.json"
//! response_schema = "response_schema.json"
//! policies = ["policy.yaml"]
//!
//! [server]
//! port = 8080
//! request_timeout_ms = 5000
//! max_body_bytes = 10485760
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//! Command-line flags take precedence over file values.

use std::path::{Path, PathBuf};

use praxis_eval::{Engine, PolicyRegistry};
use praxis_schema::Schema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::EngineArgs;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    pub request_schema: Option<PathBuf>,
    pub response_schema: Option<PathBuf>,
    /// Policy sources, merged in order. `.json` files are read as JSON,
    /// anything else as YAML.
    #[serde(default)]
    pub policies: Vec<PathBuf>,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            port: default_port(),
            request_timeout_ms: default_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config file, resolving its relative paths.
pub fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let mut config: Config = toml::from_str(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let engine = &mut config.engine;
    for p in engine
        .request_schema
        .iter_mut()
        .chain(engine.response_schema.iter_mut())
        .chain(engine.policies.iter_mut())
    {
        if p.is_relative() {
            *p = base.join(&*p);
        }
    }
    if config.server.request_timeout_ms == 0 {
        return Err(format!(
            "invalid '{}': request_timeout_ms must be positive",
            path.display()
        ));
    }
    Ok(config)
}

/// The config named by `--config`, or defaults when there is none.
pub fn load_config(args: &EngineArgs) -> Result<Config, String> {
    match &args.config {
        Some(path) => read_config(path),
        None => Ok(Config::default()),
    }
}

/// Apply command-line overrides to the file's engine settings.
pub fn engine_settings(config: &Config, args: &EngineArgs) -> EngineSettings {
    let mut settings = config.engine.clone();
    if !args.policies.is_empty() {
        settings.policies = args.policies.clone();
    }
    if args.request_schema.is_some() {
        settings.request_schema = args.request_schema.clone();
    }
    if args.response_schema.is_some() {
        settings.response_schema = args.response_schema.clone();
    }
    settings
}

pub fn read_schema(path: &Path) -> Result<Schema, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read schema '{}': {}", path.display(), e))?;
    Schema::from_json_str(&content)
        .map_err(|e| format!("invalid schema '{}': {}", path.display(), e))
}

pub fn read_policies(path: &Path) -> Result<PolicyRegistry, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read policies '{}': {}", path.display(), e))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let registry = if is_json {
        PolicyRegistry::from_json_str(&content)
    } else {
        PolicyRegistry::from_yaml_str(&content)
    };
    registry.map_err(|e| format!("could not load '{}': {}", path.display(), e))
}

/// Load every source named in `settings` into an engine.
pub fn build_engine(settings: &EngineSettings) -> Result<Engine, String> {
    let mut registry = PolicyRegistry::new();
    for path in &settings.policies {
        let loaded = read_policies(path)?;
        info!(source = %path.display(), policies = loaded.len(), "loaded policies");
        registry.merge(loaded);
    }

    let mut engine = Engine::new(registry);
    if let Some(path) = &settings.request_schema {
        engine = engine.with_request_schema(read_schema(path)?);
    }
    if let Some(path) = &settings.response_schema {
        engine = engine.with_response_schema(read_schema(path)?);
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("praxis.toml");
        fs::write(
            &path,
            "[engine]\nrequest_schema = \"schemas/req.json\"\npolicies = [\"p.yaml\", \"/abs/q.yaml\"]\n",
        )
        .unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(
            config.engine.request_schema.as_deref(),
            Some(dir.path().join("schemas/req.json").as_path())
        );
        assert_eq!(config.engine.policies[0], dir.path().join("p.yaml"));
        assert_eq!(config.engine.policies[1], PathBuf::from("/abs/q.yaml"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn flags_override_file_values() {
        let config = Config {
            engine: EngineSettings {
                request_schema: Some("a.json".into()),
                response_schema: Some("b.json".into()),
                policies: vec!["p.yaml".into()],
            },
            server: ServerSettings::default(),
        };
        let args = EngineArgs {
            policies: vec!["override.yaml".into()],
            request_schema: None,
            response_schema: Some("c.json".into()),
            config: None,
        };
        let settings = engine_settings(&config, &args);
        assert_eq!(settings.policies, vec![PathBuf::from("override.yaml")]);
        assert_eq!(settings.request_schema, Some(PathBuf::from("a.json")));
        assert_eq!(settings.response_schema, Some(PathBuf::from("c.json")));
    }

    #[test]
    fn rejects_zero_timeout_and_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("praxis.toml");
        fs::write(&path, "[server]\nrequest_timeout_ms = 0\n").unwrap();
        assert!(read_config(&path).unwrap_err().contains("request_timeout_ms"));
        fs::write(&path, "[server\n").unwrap();
        assert!(read_config(&path).unwrap_err().starts_with("could not parse"));
    }

    #[test]
    fn later_policy_sources_replace_earlier_names() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.yaml");
        let second = dir.path().join("b.json");
        fs::write(&first, "p:\n  - \"$.a > 1\"\nq:\n  - SET $.q = 1\n").unwrap();
        fs::write(&second, r#"{"p": ["$.a > 2", "$.a < 9"]}"#).unwrap();
        let engine = build_engine(&EngineSettings {
            policies: vec![first, second],
            ..EngineSettings::default()
        })
        .unwrap();
        assert_eq!(engine.policies().len(), 2);
        assert_eq!(engine.policies().get("p").unwrap().rules.len(), 2);
        assert!(engine.request_schema().is_none());
    }
}
