use std::fmt;

use serde::Deserialize;

/// Exact type name or a `prefix.*` / `prefix::*` wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePattern {
    /// Matches one type name exactly
    Exact(String),
    /// Matches every type below a package or module prefix
    ///
    /// The stored prefix keeps its separator (`pets::` or `com.pets.`)
    /// so `pets::*` does not match `petshop::Error`.
    Prefix(String),
}

impl TypePattern {
    /// Parse a pattern string
    ///
    /// # Errors
    ///
    /// Returns an error for empty patterns or wildcards in unsupported positions
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("type pattern must not be empty".to_owned());
        }

        let prefix = raw
            .strip_suffix("::*")
            .map(|p| (p, "::"))
            .or_else(|| raw.strip_suffix(".*").map(|p| (p, ".")));

        match prefix {
            Some((prefix, _)) if prefix.is_empty() || prefix.contains('*') => {
                Err(format!("invalid wildcard pattern: `{raw}`"))
            }
            Some((prefix, separator)) => Ok(Self::Prefix(format!("{prefix}{separator}"))),
            None if raw.contains('*') => Err(format!("wildcards are only allowed as a trailing `.*` or `::*`: `{raw}`")),
            None => Ok(Self::Exact(raw.to_owned())),
        }
    }

    /// Whether the pattern matches the given type name
    pub fn matches(&self, type_name: &str) -> bool {
        match self {
            Self::Exact(name) => name == type_name,
            Self::Prefix(prefix) => type_name.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

impl<'de> Deserialize<'de> for TypePattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
