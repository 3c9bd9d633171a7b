use std::str::FromStr;

use serde::Deserialize;

/// Build environment flag.
///
/// `production` switches the minification and image recompression stages on;
/// `development` leaves outputs readable and keeps rebuilds fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "invalid env: {other} (expected \"development\" or \"production\")"
            )),
        }
    }
}

/// Mode for storing incremental cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStoreMode {
    /// Keep cache entries in memory only (lost on restart).
    Memory,
    /// Persist cache entries under `.assetflow/cache`.
    Disk,
}

impl Default for CacheStoreMode {
    fn default() -> Self {
        CacheStoreMode::Memory
    }
}
