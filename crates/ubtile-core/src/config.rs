//! Loading platform and policy configuration
//!
//! A [`TilingConfig`] is a plain value: load it once (JSON or environment)
//! and hand it to [`TilingConfig::tiler`].
//!
//! Environment variables:
//!
//! | Variable                       | Meaning                                   |
//! |--------------------------------|-------------------------------------------|
//! | `UBTILE_CORE_COUNT`            | parallel cores                            |
//! | `UBTILE_SCRATCH_BYTES`         | scratch bytes per core                    |
//! | `UBTILE_BLOCK_BYTES`           | alignment block size (power of two)       |
//! | `UBTILE_CORE_ORDER`            | `big-first` or `big-last`                 |
//! | `UBTILE_SINGLE_CORE_WHEN_FITS` | `true`/`1`/`yes` or `false`/`0`/`no`      |

use crate::budget::{PlatformBudget, DEFAULT_BLOCK_BYTES, DEFAULT_CORE_COUNT, DEFAULT_SCRATCH_BYTES};
use crate::error::{Result, TilingError};
use crate::plan::Tiler;
use crate::policy::{CoreOrder, SmallInputPolicy, TilingPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub const ENV_CORE_COUNT: &str = "UBTILE_CORE_COUNT";
pub const ENV_SCRATCH_BYTES: &str = "UBTILE_SCRATCH_BYTES";
pub const ENV_BLOCK_BYTES: &str = "UBTILE_BLOCK_BYTES";
pub const ENV_CORE_ORDER: &str = "UBTILE_CORE_ORDER";
pub const ENV_SINGLE_CORE_WHEN_FITS: &str = "UBTILE_SINGLE_CORE_WHEN_FITS";

/// Platform budget plus tiling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TilingConfig {
    pub budget: PlatformBudget,
    #[serde(default)]
    pub policy: TilingPolicy,
}

impl TilingConfig {
    pub fn new(budget: PlatformBudget, policy: TilingPolicy) -> Self {
        Self { budget, policy }
    }

    /// Parse a JSON document, validating the budget and policy
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] for malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TilingError::invalid("config", e.to_string()))?;
        config.policy.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TilingError::invalid("config", e.to_string()))
    }

    /// Build a configuration from `UBTILE_*` environment variables
    ///
    /// Unset variables keep the defaults of [`PlatformBudget::default`] and
    /// [`TilingPolicy::default`].
    ///
    /// # Errors
    ///
    /// [`TilingError::InvalidConfig`] naming the first malformed variable.
    pub fn from_env() -> Result<Self> {
        let core_count = parse_var(ENV_CORE_COUNT, "core_count")?.unwrap_or(DEFAULT_CORE_COUNT);
        let scratch_bytes = parse_var(ENV_SCRATCH_BYTES, "scratch_bytes")?.unwrap_or(DEFAULT_SCRATCH_BYTES);
        let block_bytes = parse_var(ENV_BLOCK_BYTES, "block_bytes")?.unwrap_or(DEFAULT_BLOCK_BYTES);
        let budget = PlatformBudget::new(core_count, scratch_bytes, block_bytes)?;

        let mut policy = TilingPolicy::default();
        if let Some(value) = read_var(ENV_CORE_ORDER) {
            policy.core_order = match value.to_ascii_lowercase().as_str() {
                "big-first" | "big-cores-first" => CoreOrder::BigCoresFirst,
                "big-last" | "big-cores-last" => CoreOrder::BigCoresLast,
                other => {
                    return Err(TilingError::invalid(
                        "core_order",
                        format!("expected big-first or big-last, got {other:?}"),
                    ))
                }
            };
        }
        if let Some(value) = read_var(ENV_SINGLE_CORE_WHEN_FITS) {
            policy.small_input = if parse_flag(&value, "single_core_when_fits")? {
                SmallInputPolicy::SingleCoreWhenFits
            } else {
                SmallInputPolicy::Spread
            };
        }

        tracing::debug!(%budget, ?policy, "loaded tiling config from environment");
        Ok(Self { budget, policy })
    }

    /// Tiler using this configuration
    pub fn tiler(&self) -> Tiler {
        Tiler::new(self.budget).with_policy(self.policy)
    }
}

fn read_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str, field: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    read_var(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| TilingError::invalid(field, format!("{key}={value:?}: {e}")))
        })
        .transpose()
}

fn parse_flag(value: &str, field: &'static str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(TilingError::invalid(field, format!("expected a boolean, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 5] = [
        ENV_CORE_COUNT,
        ENV_SCRATCH_BYTES,
        ENV_BLOCK_BYTES,
        ENV_CORE_ORDER,
        ENV_SINGLE_CORE_WHEN_FITS,
    ];

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();
        let config = TilingConfig::from_env().unwrap();
        assert_eq!(config, TilingConfig::default());
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();
        env::set_var(ENV_CORE_COUNT, "8");
        env::set_var(ENV_SCRATCH_BYTES, "2048");
        env::set_var(ENV_CORE_ORDER, "big-last");
        env::set_var(ENV_SINGLE_CORE_WHEN_FITS, "yes");

        let config = TilingConfig::from_env().unwrap();
        reset_env();

        assert_eq!(config.budget.core_count(), 8);
        assert_eq!(config.budget.scratch_bytes(), 2048);
        assert_eq!(config.budget.block_bytes(), DEFAULT_BLOCK_BYTES);
        assert_eq!(config.policy.core_order, CoreOrder::BigCoresLast);
        assert_eq!(config.policy.small_input, SmallInputPolicy::SingleCoreWhenFits);
    }

    #[test]
    fn test_from_env_malformed_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        reset_env();

        env::set_var(ENV_CORE_COUNT, "many");
        let err = TilingConfig::from_env().unwrap_err();
        assert!(matches!(err, TilingError::InvalidConfig { field: "core_count", .. }));
        reset_env();

        env::set_var(ENV_BLOCK_BYTES, "48");
        let err = TilingConfig::from_env().unwrap_err();
        assert!(matches!(err, TilingError::InvalidConfig { field: "block_bytes", .. }));
        reset_env();

        env::set_var(ENV_CORE_ORDER, "sideways");
        assert!(TilingConfig::from_env().is_err());
        reset_env();
    }

    #[test]
    fn test_json_round_trip() {
        let config = TilingConfig::new(
            PlatformBudget::new(8, 2048, 32).unwrap(),
            TilingPolicy::default().with_core_order(CoreOrder::BigCoresLast),
        );
        let json = config.to_json().unwrap();
        assert_eq!(TilingConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_validates_budget() {
        let err = TilingConfig::from_json(r#"{"budget": {"core_count": 0, "scratch_bytes": 1024}}"#).unwrap_err();
        assert!(err.is_invalid_config());

        let config = TilingConfig::from_json(r#"{"budget": {"core_count": 4, "scratch_bytes": 1024}}"#).unwrap();
        assert_eq!(config.budget.block_bytes(), 32);
        assert_eq!(config.policy, TilingPolicy::default());

        let bad_policy = r#"{"budget": {"core_count": 4, "scratch_bytes": 1024}, "policy": {"core_limit": 0}}"#;
        assert!(TilingConfig::from_json(bad_policy).is_err());
    }

    #[test]
    fn test_tiler_uses_config() {
        let config = TilingConfig::new(PlatformBudget::new(4, 2048, 32).unwrap(), TilingPolicy::default());
        assert_eq!(config.tiler().budget().core_count(), 4);
    }
}
