//! Policy configuration.
//!
//! A [`Config`] is immutable once built and is threaded through every
//! check. It can be built with chained `with_*` methods, from key/value
//! pairs, or from `SHAPECHECK_*` environment variables.
//!
//! ```
//! use shapecheck::config::{Config, ErrorPolicy, ReportPolicy};
//!
//! let config = Config::default()
//!     .with_errors(ErrorPolicy::Warn)
//!     .with_report(ReportPolicy::Raise);
//!
//! assert_eq!(config.errors(), ErrorPolicy::Warn);
//!
//! let parsed = Config::from_pairs([("errors", "skip"), ("ellipsis", "off")]).unwrap();
//! assert_eq!(parsed.errors(), ErrorPolicy::Skip);
//! assert!(!parsed.ellipsis());
//! ```

use crate::expr::{ContainerKind, Interface};
use std::fmt;
use std::str::FromStr;

/// Prefix of the environment variables read by [`Config::from_env`].
pub const ENV_PREFIX: &str = "SHAPECHECK_";

/// What to do with annotation defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Fail the whole call.
    #[default]
    Error,
    /// Treat the defective node as passing, log it and note it.
    Warn,
    /// Treat the defective node as `Any`.
    Skip,
}

/// How a failed check is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPolicy {
    /// Return `Ok(Outcome::Fail { .. })`.
    #[default]
    Return,
    /// Return `Err(CheckError::Mismatch { .. })`.
    Raise,
}

/// Handling of undeclared keys in non-total records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraKeys {
    /// Extra keys are allowed.
    #[default]
    Ignore,
    /// Extra keys fail the check.
    Reject,
}

/// A form whose content inspection can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A container kind
    Container(ContainerKind),
    /// A capability
    Interface(Interface),
}

impl Target {
    /// Looks a target up by annotation name, e.g. `List` or `Iterable`.
    pub fn from_name(name: &str) -> Option<Target> {
        ContainerKind::from_name(name)
            .map(Target::Container)
            .or_else(|| Interface::from_name(name).map(Target::Interface))
    }

    /// Whether inspection is on by default.
    pub const fn default_on(self) -> bool {
        match self {
            Target::Container(_) => true,
            Target::Interface(interface) => interface.default_introspect(),
        }
    }
}

/// Errors raised while parsing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option name that is not recognized.
    UnknownOption {
        /// The option name
        key: String,
    },
    /// A value that does not parse for its option.
    InvalidValue {
        /// The option name
        key: String,
        /// The rejected value
        value: String,
        /// What was expected
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption { key } => write!(f, "unknown option '{key}'"),
            ConfigError::InvalidValue {
                key,
                value,
                expected,
            } => write!(
                f,
                "invalid value '{value}' for option '{key}': expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error returned by the policy `FromStr` impls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError {
    value: String,
    expected: &'static str,
}

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid policy '{}': expected {}", self.value, self.expected)
    }
}

impl std::error::Error for ParsePolicyError {}

macro_rules! policy_str {
    ($ty:ident, $expected:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            /// The policy's name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ParsePolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParsePolicyError {
                        value: s.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

policy_str!(ErrorPolicy, "one of error, warn, skip", {
    "error" => Error,
    "warn" => Warn,
    "skip" => Skip,
});

policy_str!(ReportPolicy, "one of return, raise", {
    "return" => Return,
    "raise" => Raise,
});

policy_str!(ExtraKeys, "one of ignore, reject", {
    "ignore" => Ignore,
    "reject" => Reject,
});

/// Configuration for a conformance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    errors: ErrorPolicy,
    report: ReportPolicy,
    ellipsis: bool,
    extra_keys: ExtraKeys,
    signatures: bool,
    introspect: Vec<(Target, bool)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            errors: ErrorPolicy::default(),
            report: ReportPolicy::default(),
            ellipsis: true,
            extra_keys: ExtraKeys::default(),
            signatures: false,
            introspect: Vec::new(),
        }
    }
}

impl Config {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error policy.
    #[must_use]
    pub fn with_errors(mut self, errors: ErrorPolicy) -> Self {
        self.errors = errors;
        self
    }

    /// Sets the report policy.
    #[must_use]
    pub fn with_report(mut self, report: ReportPolicy) -> Self {
        self.report = report;
        self
    }

    /// Toggles variadic and empty tuple handling.
    #[must_use]
    pub fn with_ellipsis(mut self, ellipsis: bool) -> Self {
        self.ellipsis = ellipsis;
        self
    }

    /// Sets extra-key handling for non-total records.
    #[must_use]
    pub fn with_extra_keys(mut self, extra_keys: ExtraKeys) -> Self {
        self.extra_keys = extra_keys;
        self
    }

    /// Toggles the shallow callable arity check.
    #[must_use]
    pub fn with_signatures(mut self, signatures: bool) -> Self {
        self.signatures = signatures;
        self
    }

    /// Turns content inspection on or off for one form.
    #[must_use]
    pub fn with_introspection(mut self, target: Target, on: bool) -> Self {
        self.introspect.retain(|(t, _)| *t != target);
        self.introspect.push((target, on));
        self
    }

    /// The error policy.
    pub fn errors(&self) -> ErrorPolicy {
        self.errors
    }

    /// The report policy.
    pub fn report(&self) -> ReportPolicy {
        self.report
    }

    /// Whether variadic and empty tuples are inspected.
    pub fn ellipsis(&self) -> bool {
        self.ellipsis
    }

    /// Extra-key handling for non-total records.
    pub fn extra_keys(&self) -> ExtraKeys {
        self.extra_keys
    }

    /// Whether callable arities are compared.
    pub fn signatures(&self) -> bool {
        self.signatures
    }

    /// Whether the contents of `target` are inspected.
    pub fn introspects(&self, target: Target) -> bool {
        self.introspect
            .iter()
            .find(|(t, _)| *t == target)
            .map_or(target.default_on(), |(_, on)| *on)
    }

    /// Builds a configuration from option names and values.
    ///
    /// Names are case-insensitive: `errors`, `report`, `ellipsis`,
    /// `extra_keys`, `signatures`, and `introspect` / `no_introspect`
    /// taking a comma-separated list of form names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();
        for (key, value) in pairs {
            let key = key.as_ref().trim().to_ascii_lowercase();
            let value = value.as_ref();
            let invalid = |expected| ConfigError::InvalidValue {
                key: key.clone(),
                value: value.to_string(),
                expected,
            };

            match key.as_str() {
                "errors" => config.errors = parse_policy(value).map_err(invalid)?,
                "report" => config.report = parse_policy(value).map_err(invalid)?,
                "extra_keys" => config.extra_keys = parse_policy(value).map_err(invalid)?,
                "ellipsis" => config.ellipsis = parse_bool(value).ok_or_else(|| invalid(BOOL))?,
                "signatures" => {
                    config.signatures = parse_bool(value).ok_or_else(|| invalid(BOOL))?;
                }
                "introspect" | "no_introspect" => {
                    let on = key == "introspect";
                    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                        let target = Target::from_name(name).ok_or_else(|| invalid(NAMES))?;
                        config = config.with_introspection(target, on);
                    }
                }
                _ => {
                    return Err(ConfigError::UnknownOption { key: key.clone() });
                }
            }
        }
        Ok(config)
    }

    /// Builds a configuration from `SHAPECHECK_*` environment variables.
    ///
    /// `SHAPECHECK_LOG` belongs to the logger and is ignored here.
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_pairs(std::env::vars().filter_map(|(key, value)| {
            let option = key.strip_prefix(ENV_PREFIX)?;
            (option != "LOG").then(|| (option.to_string(), value))
        }))
    }
}

const BOOL: &str = "a boolean";
const NAMES: &str = "a comma-separated list of form names";

fn parse_policy<T>(s: &str) -> Result<T, &'static str>
where
    T: FromStr<Err = ParsePolicyError>,
{
    s.parse().map_err(|e: ParsePolicyError| e.expected)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.errors(), ErrorPolicy::Error);
        assert_eq!(config.report(), ReportPolicy::Return);
        assert_eq!(config.extra_keys(), ExtraKeys::Ignore);
        assert!(config.ellipsis());
        assert!(!config.signatures());
        assert!(config.introspects(Target::Container(ContainerKind::List)));
        assert!(config.introspects(Target::Interface(Interface::Iterable)));
        assert!(!config.introspects(Target::Interface(Interface::Iterator)));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("WARN".parse(), Ok(ErrorPolicy::Warn));
        assert_eq!(" raise ".parse(), Ok(ReportPolicy::Raise));
        assert_eq!("reject".parse(), Ok(ExtraKeys::Reject));
        assert!("loud".parse::<ErrorPolicy>().is_err());
        assert_eq!(ErrorPolicy::Skip.to_string(), "skip");
    }

    #[test]
    fn test_introspection_overrides() {
        let list = Target::Container(ContainerKind::List);
        let config = Config::default()
            .with_introspection(list, false)
            .with_introspection(list, true)
            .with_introspection(list, false);
        assert!(!config.introspects(list));
        assert_eq!(config.introspect.len(), 1);
    }

    #[test]
    fn test_from_pairs() {
        let config = Config::from_pairs([
            ("ERRORS", "warn"),
            ("report", "raise"),
            ("extra_keys", "reject"),
            ("signatures", "yes"),
            ("no_introspect", "List, Dict"),
            ("introspect", "Iterator"),
        ])
        .unwrap();

        assert_eq!(config.errors(), ErrorPolicy::Warn);
        assert_eq!(config.report(), ReportPolicy::Raise);
        assert_eq!(config.extra_keys(), ExtraKeys::Reject);
        assert!(config.signatures());
        assert!(!config.introspects(Target::Container(ContainerKind::List)));
        assert!(!config.introspects(Target::Container(ContainerKind::Dict)));
        assert!(config.introspects(Target::Interface(Interface::Iterator)));
    }

    #[test]
    fn test_from_pairs_errors() {
        assert_eq!(
            Config::from_pairs([("colour", "blue")]),
            Err(ConfigError::UnknownOption {
                key: "colour".to_string()
            })
        );

        let err = Config::from_pairs([("ellipsis", "maybe")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'maybe' for option 'ellipsis': expected a boolean"
        );

        assert!(Config::from_pairs([("no_introspect", "Nope")]).is_err());
    }
}
