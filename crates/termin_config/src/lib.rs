use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::warn;
pub mod models;
pub use models::*;

/// Marker value replaced by an environment variable at load time.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Loads the layered configuration:
/// `config/default` → `config/{RUN_ENV}` → `TERMIN__*` environment variables,
/// then resolves `secret_from_env` markers.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "TERMIN".to_string());
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    let config = apply_env_overrides_from_marker(raw_config)?;
    config
        .availability
        .validate()
        .map_err(|err| ConfigError::Message(format!("invalid availability config: {err}")))?;
    Ok(config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                match env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => {
                        warn!("env var {} not found for secret_from_env", env_key);
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config.
/// Unresolved markers become `null`, so optional secrets read as absent.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to resolve secrets: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment once.
///
/// `DOTENV_OVERRIDE` wins over a first CLI argument starting with `.env`,
/// which wins over the default `.env`. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_marker_is_resolved_from_env() {
        env::set_var("ADMIN_API_KEY", "s3cr3t");
        let config = AppConfig {
            admin: Some(AdminConfig {
                api_key: Some(SECRET_MARKER.to_string()),
                link_secret: None,
                public_base_url: None,
            }),
            ..AppConfig::default()
        };

        let resolved = apply_env_overrides_from_marker(config).expect("config must resolve");
        let admin = resolved.admin.expect("admin section kept");
        assert_eq!(admin.api_key.as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn unresolved_secret_becomes_absent() {
        let config = AppConfig {
            admin: Some(AdminConfig {
                api_key: None,
                link_secret: Some(SECRET_MARKER.to_string()),
                public_base_url: None,
            }),
            ..AppConfig::default()
        };
        env::remove_var("ADMIN_LINK_SECRET");

        let resolved = apply_env_overrides_from_marker(config).expect("config must resolve");
        assert!(resolved.admin.expect("admin section kept").link_secret.is_none());
    }
}
