use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::sync::transfer::DEFAULT_UPLOAD_CONCURRENCY;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("storage zone name is required (use --zone or BUNNY_STORAGE_ZONE_NAME)")]
    MissingZone,
    #[error("access key is required (use --key or BUNNY_ACCESS_KEY)")]
    MissingAccessKey,
    #[error("invalid clean mode \"{0}\"; use none, simple or avoid-deletes")]
    InvalidCleanMode(String),
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
}

/// What happens to existing remote content before uploading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanMode {
    /// Upload on top of whatever is there.
    #[default]
    None,
    /// Delete the whole target directory first.
    Simple,
    /// Delete only remote entries with no local counterpart.
    AvoidDeletes,
}

impl CleanMode {
    /// Maps the older boolean clean flag. Truthy means `Simple`.
    pub fn from_legacy_flag(clean: bool) -> Self {
        if clean { Self::Simple } else { Self::None }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CleanMode::None => "none",
            CleanMode::Simple => "simple",
            CleanMode::AvoidDeletes => "avoid-deletes",
        }
    }
}

impl FromStr for CleanMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "simple" => Ok(Self::Simple),
            "avoid-deletes" => Ok(Self::AvoidDeletes),
            _ => Err(ConfigError::InvalidCleanMode(value.to_string())),
        }
    }
}

impl fmt::Display for CleanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub storage_zone: String,
    pub access_key: String,
    /// Regional host prefix such as `ny` or `sg`.
    pub region: Option<String>,
    /// Full API base URL; takes precedence over `region`.
    pub endpoint: Option<String>,
    pub clean: CleanMode,
    pub max_concurrent_uploads: usize,
}

impl SyncConfig {
    pub fn new(storage_zone: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            storage_zone: storage_zone.into(),
            access_key: access_key.into(),
            region: None,
            endpoint: None,
            clean: CleanMode::default(),
            max_concurrent_uploads: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }

    pub fn with_clean(mut self, clean: CleanMode) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_max_concurrent_uploads(mut self, limit: usize) -> Self {
        self.max_concurrent_uploads = limit;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_zone.trim().is_empty() {
            return Err(ConfigError::MissingZone);
        }
        if self.access_key.trim().is_empty() {
            return Err(ConfigError::MissingAccessKey);
        }
        if self.max_concurrent_uploads == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}
