//! Wire dialects for combining boolean filter logic.

use serde::{Deserialize, Serialize};

/// Request dialect, chosen once per connection from the engine's major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Engines with major version 2 and above: `bool` filter context.
    #[default]
    Modern,
    /// Pre-2.x engines: `and` / `or` / `not` filter combinators.
    Legacy,
}

impl Dialect {
    /// Pick the dialect for a version string such as `"2.4.1"`.
    ///
    /// Unparseable versions fall back to [`Dialect::Modern`].
    pub fn from_version(version: &str) -> Self {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok());

        match major {
            Some(major) if major < 2 => Dialect::Legacy,
            _ => Dialect::Modern,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "modern" => Some(Dialect::Modern),
            "legacy" => Some(Dialect::Legacy),
            _ => None,
        }
    }
}
