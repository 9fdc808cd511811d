// 7.0 config.rs: every tunable in one place. defaults, validation, runtime changes.
// 7.1 parameters are either startup-only or runtime. runtime ones can change while the engine runs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// When a parameter may be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamScope {
    Startup,
    Runtime,
}

/// Value type a raw parameter string is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Double,
    Int,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub scope: ParamScope,
    pub kind: ParamKind,
}

/// Lifecycle phase of the engine applying a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Startup,
    Running,
}

/** 7.2: order-book imbalance ("signed volume") engine settings */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImbalanceParams {
    // price improvement for passive limit orders
    pub aggressiveness: Decimal,
    // shares per unit of directional signal
    pub position_size: i64,
    // pressure observations needed before the signal is trusted
    pub window_size: usize,
    // max |position| * price before adding is refused
    pub notional_cap: Decimal,
    pub debug: bool,
}

impl Default for ImbalanceParams {
    fn default() -> Self {
        Self {
            aggressiveness: dec!(0.01),
            position_size: 100,
            window_size: 20,
            notional_cap: dec!(500000),
            debug: false,
        }
    }
}

impl ImbalanceParams {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec { name: "aggressiveness", scope: ParamScope::Runtime, kind: ParamKind::Double },
        ParamSpec { name: "position_size", scope: ParamScope::Runtime, kind: ParamKind::Int },
        ParamSpec { name: "window_size", scope: ParamScope::Startup, kind: ParamKind::Int },
        ParamSpec { name: "notional_cap", scope: ParamScope::Runtime, kind: ParamKind::Double },
        ParamSpec { name: "debug", scope: ParamScope::Runtime, kind: ParamKind::Bool },
    ];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aggressiveness < Decimal::ZERO {
            return Err(ConfigError::invalid("aggressiveness", "must not be negative"));
        }
        if self.position_size <= 0 {
            return Err(ConfigError::invalid("position_size", "must be positive"));
        }
        if self.window_size == 0 {
            return Err(ConfigError::invalid("window_size", "must be at least 1"));
        }
        if self.notional_cap <= Decimal::ZERO {
            return Err(ConfigError::invalid("notional_cap", "must be positive"));
        }
        Ok(())
    }

    /// Parse, validate and apply one named parameter. state is untouched on error.
    pub fn apply(&mut self, name: &str, raw: &str, phase: Phase) -> Result<(), ConfigError> {
        let spec = lookup(Self::PARAMS, name, phase)?;
        let mut next = self.clone();
        match spec.name {
            "aggressiveness" => next.aggressiveness = parse_decimal(name, raw)?,
            "position_size" => next.position_size = parse_int(name, raw)?,
            "window_size" => next.window_size = parse_usize(name, raw)?,
            "notional_cap" => next.notional_cap = parse_decimal(name, raw)?,
            "debug" => next.debug = parse_bool(name, raw)?,
            _ => return Err(ConfigError::UnknownParam(name.to_string())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/** 7.3: pairs divergence engine settings */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairsParams {
    // units per divergence signal
    pub trade_size: i64,
    // leverage of leg Y relative to leg X (3 for a 3x ETF against its underlying)
    pub leverage_ratio: Decimal,
    pub debug: bool,
}

impl Default for PairsParams {
    fn default() -> Self {
        Self {
            trade_size: 1,
            leverage_ratio: dec!(3),
            debug: false,
        }
    }
}

impl PairsParams {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec { name: "trade_size", scope: ParamScope::Runtime, kind: ParamKind::Int },
        ParamSpec { name: "leverage_ratio", scope: ParamScope::Runtime, kind: ParamKind::Double },
        ParamSpec { name: "debug", scope: ParamScope::Runtime, kind: ParamKind::Bool },
    ];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trade_size <= 0 {
            return Err(ConfigError::invalid("trade_size", "must be positive"));
        }
        if self.leverage_ratio <= Decimal::ZERO {
            return Err(ConfigError::invalid("leverage_ratio", "must be positive"));
        }
        Ok(())
    }

    pub fn apply(&mut self, name: &str, raw: &str, phase: Phase) -> Result<(), ConfigError> {
        let spec = lookup(Self::PARAMS, name, phase)?;
        let mut next = self.clone();
        match spec.name {
            "trade_size" => next.trade_size = parse_int(name, raw)?,
            "leverage_ratio" => next.leverage_ratio = parse_decimal(name, raw)?,
            "debug" => next.debug = parse_bool(name, raw)?,
            _ => return Err(ConfigError::UnknownParam(name.to_string())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/** 7.4: full configuration as loaded by the host */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub imbalance: ImbalanceParams,
    pub pairs: PairsParams,
    // where bar snapshots are written. None keeps them in memory only
    pub snapshot_path: Option<PathBuf>,
}

impl StrategyConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.imbalance.validate()?;
        self.pairs.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {param}: {reason}")]
    InvalidValue { param: String, reason: String },

    #[error("Unknown parameter {0}")]
    UnknownParam(String),

    #[error("Parameter {0} can only be set at startup")]
    StartupOnly(String),

    #[error("Could not parse {param} from {raw:?}")]
    BadFormat { param: String, raw: String },

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Could not read config {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },
}

impl ConfigError {
    fn invalid(param: &str, reason: &str) -> Self {
        ConfigError::InvalidValue {
            param: param.to_string(),
            reason: reason.to_string(),
        }
    }

    fn bad_format(param: &str, raw: &str) -> Self {
        ConfigError::BadFormat {
            param: param.to_string(),
            raw: raw.to_string(),
        }
    }
}

fn lookup(specs: &'static [ParamSpec], name: &str, phase: Phase) -> Result<&'static ParamSpec, ConfigError> {
    let spec = specs
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ConfigError::UnknownParam(name.to_string()))?;
    if spec.scope == ParamScope::Startup && phase == Phase::Running {
        return Err(ConfigError::StartupOnly(name.to_string()));
    }
    Ok(spec)
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(raw.trim()).map_err(|_| ConfigError::bad_format(name, raw))
}

fn parse_int(name: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::bad_format(name, raw))
}

fn parse_usize(name: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::bad_format(name, raw))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::bad_format(name, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.imbalance.notional_cap, dec!(500000));
        assert_eq!(config.pairs.leverage_ratio, dec!(3));
    }

    #[test]
    fn test_runtime_param_change() {
        let mut params = ImbalanceParams::default();
        params.apply("aggressiveness", "0.05", Phase::Running).unwrap();
        params.apply("debug", "true", Phase::Running).unwrap();
        assert_eq!(params.aggressiveness, dec!(0.05));
        assert!(params.debug);
    }

    #[test]
    fn test_startup_only_rejected_while_running() {
        let mut params = ImbalanceParams::default();
        let result = params.apply("window_size", "50", Phase::Running);
        assert_eq!(result, Err(ConfigError::StartupOnly("window_size".to_string())));
        assert_eq!(params.window_size, 20);

        params.apply("window_size", "50", Phase::Startup).unwrap();
        assert_eq!(params.window_size, 50);
    }

    #[test]
    fn test_invalid_value_leaves_state() {
        let mut params = PairsParams::default();
        let result = params.apply("trade_size", "-4", Phase::Running);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(params.trade_size, 1);

        let result = params.apply("leverage_ratio", "three", Phase::Running);
        assert!(matches!(result, Err(ConfigError::BadFormat { .. })));
    }

    #[test]
    fn test_unknown_param() {
        let mut params = PairsParams::default();
        assert_eq!(
            params.apply("z_score", "2", Phase::Running),
            Err(ConfigError::UnknownParam("z_score".to_string()))
        );
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{ "imbalance": { "position_size": 200, "window_size": 5 }, "pairs": { "trade_size": 10 } }"#;
        let config = StrategyConfig::from_json(json).unwrap();
        assert_eq!(config.imbalance.position_size, 200);
        assert_eq!(config.imbalance.window_size, 5);
        assert_eq!(config.imbalance.aggressiveness, dec!(0.01));
        assert_eq!(config.pairs.trade_size, 10);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let json = r#"{ "imbalance": { "window_size": 0 } }"#;
        assert!(matches!(
            StrategyConfig::from_json(json),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(StrategyConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = StrategyConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
