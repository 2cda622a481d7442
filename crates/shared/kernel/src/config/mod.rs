use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Legacy variable holding the database URL; wins over every other source.
pub const DB_URL_ENV: &str = "DB_URL";
/// Prefix of environment overrides (`INGEST__DATABASE__URL` maps to `database.url`).
pub const ENV_PREFIX: &str = "INGEST";

/// Error raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config {
        #[source]
        source: config::ConfigError,
        context: Option<Cow<'static, str>>,
    },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

trait ConfigErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

/// Loads configuration from a file plus environment overrides.
///
/// Sources, lowest priority first:
/// 1. **File**: `path` (required when given) or an optional `server.toml` in the working directory.
/// 2. **Environment**: variables prefixed with `INGEST__`, nested keys separated by `__`
///    (`INGEST__SERVER__PORT=9000`). `security.cors_origins` accepts a comma separated list.
/// 3. **`DB_URL`**: overrides `database.url`, for deployments that only inject that variable.
///
/// # Errors
/// Returns an error if an explicit file is missing, a source is malformed, or the merged
/// values do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use ingest_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from("server.toml"), |p| p.as_ref().to_path_buf());

    info!(path = %effective_path.display(), required, "Loading config");

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake)
                .list_separator(",")
                .with_list_parse_key("security.cors_origins")
                .try_parsing(true),
        )
        .set_override_option("database.url", std::env::var(DB_URL_ENV).ok())
        .context("Failed to apply DB_URL override")?
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_domain::config::ApiConfig;
    use std::io::Write;

    #[test]
    fn loads_values_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp file");
        writeln!(
            file,
            "[server]\nport = 9100\n\n[security]\nadmin_group = 3\ncors_origins = [\"https://example.org\"]\n"
        )
        .expect("write config");

        let cfg: ApiConfig = load_config(Some(file.path())).expect("config loads");
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.security.admin_group, 3);
        assert_eq!(cfg.security.cors_origins, vec!["https://example.org".to_owned()]);
        assert_eq!(cfg.pagination.default_page_size, 100);
    }

    #[test]
    fn default_file_is_optional() {
        // The crate directory has no server.toml.
        assert!(load_config::<ApiConfig>(None::<&str>).is_ok());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config::<ApiConfig>(Some("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Config error (Failed to build config)"));
    }
}
