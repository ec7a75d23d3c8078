use std::{env, str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Upper bound on stored notices; `None` means unbounded.
    pub max_notices: Option<usize>,
    /// Period of the background expiry sweep; `None` disables it.
    pub sweep_interval: Option<Duration>,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    /// Directory with the static admin/student pages, served as a fallback.
    pub static_dir: Option<String>,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup. Empty values are
    /// treated as unset.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "PORT", 5000)?,
            max_notices: parse_opt::<usize>(&var, "MAX_NOTICES")?
                .map(|n| positive("MAX_NOTICES", n))
                .transpose()?,
            sweep_interval: parse_opt::<u64>(&var, "SWEEP_INTERVAL_SECS")?
                .map(|secs| positive("SWEEP_INTERVAL_SECS", secs).map(Duration::from_secs))
                .transpose()?,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            static_dir: var("STATIC_DIR"),
            max_body_bytes: parse_or(&var, "MAX_BODY_BYTES", 64 * 1024)?,
        })
    }
}

fn parse_opt<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|v| {
            v.trim()
                .parse()
                .with_context(|| format!("Invalid value for {key}: {v:?}"))
        })
        .transpose()
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(var, key)?.unwrap_or(default))
}

fn positive<T: PartialEq + Default>(key: &str, value: T) -> anyhow::Result<T> {
    if value == T::default() {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(value)
}
