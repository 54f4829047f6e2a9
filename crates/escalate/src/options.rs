//! Option schema and layered resolution.
//!
//! Every become method declares its options as a static table of [`OptionSpec`]
//! records. Each record lists the places a value may come from, in precedence
//! order; the first source that yields a non-empty value wins and the declared
//! default applies otherwise.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::error::{BecomeError, BecomeResult};
use crate::sources::{IniConfig, OptionSources};

/// Where an option value may be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRef {
    /// A process environment variable.
    EnvVar { name: &'static str },
    /// A host (inventory or command-line) variable.
    HostVar { name: &'static str },
    /// A key inside an ini section.
    IniKey {
        section: &'static str,
        key: &'static str,
    },
}

impl SourceRef {
    pub const fn env(name: &'static str) -> Self {
        Self::EnvVar { name }
    }

    pub const fn var(name: &'static str) -> Self {
        Self::HostVar { name }
    }

    pub const fn ini(section: &'static str, key: &'static str) -> Self {
        Self::IniKey { section, key }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVar { name } => write!(f, "env:{name}"),
            Self::HostVar { name } => write!(f, "var:{name}"),
            Self::IniKey { section, key } => write!(f, "ini:[{section}] {key}"),
        }
    }
}

/// A named configuration option with its resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Value used when no source yields one.
    pub default: Option<&'static str>,
    /// Whether resolving to nothing is an error.
    pub required: bool,
    /// Sources in precedence order (first match wins).
    pub sources: &'static [SourceRef],
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Source(SourceRef),
    Default,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(source) => source.fmt(f),
            Self::Default => f.write_str("default"),
        }
    }
}

/// An option value together with the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub origin: Origin,
}

/// Resolve an option against the three lookup collaborators.
///
/// Returns `Ok(None)` when nothing matched and the option has no default.
pub fn resolve_option(
    option: &OptionSpec,
    environment: &HashMap<String, String>,
    host_vars: &HashMap<String, String>,
    ini: &IniConfig,
) -> BecomeResult<Option<String>> {
    let lookup = |source: &SourceRef| match *source {
        SourceRef::EnvVar { name } => environment.get(name).cloned(),
        SourceRef::HostVar { name } => host_vars.get(name).cloned(),
        SourceRef::IniKey { section, key } => ini.get(section, key),
    };
    Ok(resolve_with(option, lookup)?.map(|resolved| resolved.value))
}

/// Resolve an option against bundled sources, reporting where the value came from.
pub fn resolve_option_with_origin(
    option: &OptionSpec,
    sources: &OptionSources,
) -> BecomeResult<Option<Resolved>> {
    resolve_with(option, |source| sources.lookup(source))
}

fn resolve_with<F>(option: &OptionSpec, lookup: F) -> BecomeResult<Option<Resolved>>
where
    F: Fn(&SourceRef) -> Option<String>,
{
    for source in option.sources {
        if let Some(value) = lookup(source).filter(|v| !v.is_empty()) {
            debug!("option {} resolved from {}", option.name, source);
            return Ok(Some(Resolved {
                value,
                origin: Origin::Source(*source),
            }));
        }
    }

    match option.default {
        Some(default) => Ok(Some(Resolved {
            value: default.to_string(),
            origin: Origin::Default,
        })),
        None if option.required => Err(BecomeError::Configuration {
            option: option.name.to_string(),
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: OptionSpec = OptionSpec {
        name: "sample",
        description: "sample option",
        default: Some("fallback"),
        required: false,
        sources: &[
            SourceRef::var("sample_var"),
            SourceRef::env("SAMPLE_ENV"),
            SourceRef::ini("section", "sample"),
        ],
    };

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let value = resolve_option(&SAMPLE, &map(&[]), &map(&[]), &IniConfig::empty()).unwrap();
        assert_eq!(value.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_host_var_beats_env() {
        let env = map(&[("SAMPLE_ENV", "from-env")]);
        let vars = map(&[("sample_var", "from-var")]);
        let value = resolve_option(&SAMPLE, &env, &vars, &IniConfig::empty()).unwrap();
        assert_eq!(value.as_deref(), Some("from-var"));
    }

    #[test]
    fn test_empty_value_is_skipped() {
        let env = map(&[("SAMPLE_ENV", "from-env")]);
        let vars = map(&[("sample_var", "")]);
        let value = resolve_option(&SAMPLE, &env, &vars, &IniConfig::empty()).unwrap();
        assert_eq!(value.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_optional_without_default_is_none() {
        let option = OptionSpec {
            default: None,
            ..SAMPLE
        };
        let value = resolve_option(&option, &map(&[]), &map(&[]), &IniConfig::empty()).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_required_without_value_errors() {
        let option = OptionSpec {
            default: None,
            required: true,
            ..SAMPLE
        };
        let err = resolve_option(&option, &map(&[]), &map(&[]), &IniConfig::empty()).unwrap_err();
        assert!(matches!(err, BecomeError::Configuration { ref option } if option == "sample"));
    }

    #[test]
    fn test_origin_reports_winning_source() {
        let sources = OptionSources::new(
            map(&[("SAMPLE_ENV", "from-env")]),
            HashMap::new(),
            IniConfig::empty(),
        );
        let resolved = resolve_option_with_origin(&SAMPLE, &sources)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, "from-env");
        assert_eq!(resolved.origin, Origin::Source(SourceRef::env("SAMPLE_ENV")));
        assert_eq!(resolved.origin.to_string(), "env:SAMPLE_ENV");
    }
}
