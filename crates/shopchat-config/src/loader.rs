use std::path::{Path, PathBuf};

use shopchat_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

const DEFAULT_CONFIG_FILE: &str = "shopchat.yml";

/// Loads `AppConfig` from defaults, an optional YAML file, then environment variables.
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Load using the real process environment.
    pub fn load(&self) -> Result<AppConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Load with a custom environment lookup.
    pub fn load_with_env<F>(&self, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.resolve_path() {
            Some(path) => Self::read_file(&path)?,
            None => {
                debug!("no config file found, using defaults");
                AppConfig::default()
            }
        };

        apply_env_overrides(&mut config, env)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        fallback.is_file().then_some(fallback)
    }

    fn read_file(path: &Path) -> Result<AppConfig> {
        info!("loading config from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::parse_yaml(&raw)
    }

    pub fn parse_yaml(raw: &str) -> Result<AppConfig> {
        if raw.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(raw).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SHOPCHAT_HOST") {
        config.gateway.host = v;
    }
    if let Some(v) = get("SHOPCHAT_PORT") {
        config.gateway.port = v
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid SHOPCHAT_PORT {v:?}: {e}")))?;
    }

    if let Some(v) = get("ODOO_URL") {
        config.catalog.url = Some(v);
    }
    if let Some(v) = get("ODOO_DB") {
        config.catalog.database = Some(v);
    }
    if let Some(v) = get("ODOO_USERNAME") {
        config.catalog.username = Some(v);
    }
    if let Some(v) = get("ODOO_API_KEY").or_else(|| get("API_KEY")) {
        config.catalog.api_key = Some(v);
    }

    if let Some(v) = get("GOOGLE_API_KEY") {
        config.inference.api_key = Some(v);
    }
    if let Some(v) = get("GEMINI_MODEL") {
        config.inference.model = v;
    }

    if let Some(v) = get("WHATSAPP_API_TOKEN") {
        config.whatsapp.api_token = Some(v);
    }
    if let Some(v) = get("WHATSAPP_VERIFY_TOKEN") {
        config.whatsapp.verify_token = Some(v);
    }
    if let Some(v) = get("WHATSAPP_PHONE_NUMBER_ID") {
        config.whatsapp.phone_number_id = Some(v);
    }

    if let Some(v) = get("REDIS_URL") {
        config.history.redis_url = v;
    }

    Ok(())
}

impl AppConfig {
    /// Reject values that can never work. Missing credentials are allowed here;
    /// the component that needs them reports the problem.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.port == 0 {
            return Err(Error::Config("gateway.port must be non-zero".into()));
        }

        check_url("inference.api_url", &self.inference.api_url)?;
        check_url("whatsapp.api_base_url", &self.whatsapp.api_base_url)?;
        if let Some(url) = &self.catalog.url {
            check_url("catalog.url", url)?;
        }

        if self.inference.timeout_secs == 0 {
            return Err(Error::Config(
                "inference.timeout_secs must be non-zero".into(),
            ));
        }
        if let Some(t) = self.inference.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(Error::Config(format!(
                    "inference.temperature must be between 0 and 2, got {t}"
                )));
            }
        }
        if self.inference.max_output_tokens == Some(0) {
            return Err(Error::Config(
                "inference.max_output_tokens must be at least 1 when set".into(),
            ));
        }
        if self.history.max_turns == Some(0) {
            return Err(Error::Config(
                "history.max_turns must be at least 1 when set".into(),
            ));
        }
        if self.gateway.rate_limit.enabled
            && (self.gateway.rate_limit.per_second == 0 || self.gateway.rate_limit.burst_size == 0)
        {
            return Err(Error::Config(
                "gateway.rate_limit values must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| Error::Config(format!("{field} is not a valid URL ({value}): {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!("{field} must use http or https")));
    }
    Ok(())
}
