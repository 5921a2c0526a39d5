//! Strategy configuration and instance names

use std::time::Duration;

use kite_core::{Name, version_component, version_from_component};
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// Versioned strategy name
pub const STRATEGY_NAME: &str = "/localhost/nfd/strategy/kite/%FD%01";

/// Version implemented by this build
pub const STRATEGY_VERSION: u64 = 1;

/// Route validity used when an acknowledgment installs a mobility route
pub const DEFAULT_ANNOUNCE_VALIDITY: Duration = Duration::from_secs(5 * 60);

/// Tunables for [`KiteStrategy`](crate::KiteStrategy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Validity of routes installed from a mobility acknowledgment
    pub announce_validity: Duration,
    /// Validity sent when withdrawing a stale mobility route
    pub withdraw_validity: Duration,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            announce_validity: DEFAULT_ANNOUNCE_VALIDITY,
            withdraw_validity: Duration::ZERO,
        }
    }
}

impl StrategyConfig {
    /// Set the validity of announced routes
    pub fn with_announce_validity(mut self, validity: Duration) -> Self {
        self.announce_validity = validity;
        self
    }

    /// Set the validity sent on withdrawal
    pub fn with_withdraw_validity(mut self, validity: Duration) -> Self {
        self.withdraw_validity = validity;
        self
    }
}

/// A strategy instance name split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstanceName {
    /// Name up to and including the version component
    pub strategy_name: Name,
    /// Version, if the name carried one
    pub version: Option<u64>,
    /// Components after the version
    pub parameters: Name,
}

/// The versioned strategy name as a [`Name`]
pub fn strategy_name() -> Name {
    Name::from_components(["localhost", "nfd", "strategy", "kite"])
        .append(version_component(STRATEGY_VERSION))
}

/// Split an instance name at its last version component
pub fn parse_instance_name(input: &Name) -> ParsedInstanceName {
    let versioned = (0..input.len())
        .rev()
        .find_map(|i| Some((i, version_from_component(input.get(i)?).ok()?)));

    match versioned {
        Some((i, version)) => ParsedInstanceName {
            strategy_name: input.prefix(i + 1),
            version: Some(version),
            parameters: input.sub_name(i + 1),
        },
        None => ParsedInstanceName {
            strategy_name: input.clone(),
            version: None,
            parameters: Name::root(),
        },
    }
}

/// The instance name to report: `input` if it is versioned, otherwise
/// `input` with the version of `strategy_name` appended
pub fn make_instance_name(input: &Name, strategy_name: &Name) -> Name {
    if parse_instance_name(input).version.is_some() {
        return input.clone();
    }
    match strategy_name.get(strategy_name.len().saturating_sub(1)) {
        Some(version) => input.clone().append(version),
        None => input.clone(),
    }
}

/// Validate a requested instance name and normalize it
pub fn validate_instance_name(input: &Name) -> Result<Name, StrategyError> {
    let parsed = parse_instance_name(input);
    if !parsed.parameters.is_empty() {
        return Err(StrategyError::ParametersNotAccepted(input.to_string()));
    }
    if let Some(version) = parsed.version
        && version != STRATEGY_VERSION
    {
        return Err(StrategyError::UnsupportedVersion(version));
    }

    let canonical = strategy_name();
    let unversioned = canonical.prefix(canonical.len() - 1);
    let requested = match parsed.version {
        Some(_) => parsed.strategy_name.prefix(parsed.strategy_name.len() - 1),
        None => parsed.strategy_name,
    };
    if requested != unversioned {
        return Err(StrategyError::InvalidInstanceName(input.to_string()));
    }

    Ok(make_instance_name(input, &canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::parse(uri).unwrap()
    }

    #[test]
    fn test_strategy_name_constant() {
        assert_eq!(strategy_name().to_string(), STRATEGY_NAME);
    }

    #[test]
    fn test_parse_instance_name() {
        let parsed = parse_instance_name(&name("/localhost/nfd/strategy/kite/%FD%01/x/y"));
        assert_eq!(parsed.version, Some(1));
        assert_eq!(parsed.strategy_name.to_string(), STRATEGY_NAME);
        assert_eq!(parsed.parameters.to_string(), "/x/y");

        let parsed = parse_instance_name(&name("/localhost/nfd/strategy/kite"));
        assert_eq!(parsed.version, None);
        assert!(parsed.parameters.is_empty());
    }

    #[test]
    fn test_validate_instance_name() {
        assert_eq!(
            validate_instance_name(&name("/localhost/nfd/strategy/kite")).unwrap(),
            strategy_name()
        );
        assert_eq!(
            validate_instance_name(&name(STRATEGY_NAME)).unwrap(),
            strategy_name()
        );
        assert_eq!(
            validate_instance_name(&name("/localhost/nfd/strategy/kite/%FD%02")),
            Err(StrategyError::UnsupportedVersion(2))
        );
        assert!(matches!(
            validate_instance_name(&name("/localhost/nfd/strategy/kite/%FD%01/param")),
            Err(StrategyError::ParametersNotAccepted(_))
        ));
        assert!(matches!(
            validate_instance_name(&name("/localhost/nfd/strategy/best-route")),
            Err(StrategyError::InvalidInstanceName(_))
        ));
    }

    #[test]
    fn test_config_defaults_and_serde() {
        let config = StrategyConfig::default();
        assert_eq!(config.announce_validity, Duration::from_secs(300));
        assert_eq!(config.withdraw_validity, Duration::ZERO);

        let config = config.with_announce_validity(Duration::from_secs(60));
        let json = serde_json::to_string(&config).unwrap();
        let decoded: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);

        let partial: StrategyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(partial, StrategyConfig::default());
    }
}
