// In: src/config.rs

//! The single source of truth for codec configuration.
//!
//! `CodecConfig` is created once at the application boundary (from a JSON
//! document or in code) and shared read-only behind an `Arc` by every encode
//! and decode call of a [`crate::bridge::Codec`].

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

//==================================================================================
// I. Policies
//==================================================================================

/// What to do with a series or encoder that has no data points.
///
/// Historical revisions of the format disagree here, so the choice is explicit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptySeriesPolicy {
    /// **Default:** keep the identity. The input projects exactly one row with
    /// every positional and value cell null. In list mode the row holds the
    /// identity cells; in single-series mode the identity is in the metadata.
    #[default]
    MetadataRow,

    /// Fail with [`CodecError::EmptySeries`].
    Reject,
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Number of rows per record batch. `0` means a single batch holding the
    /// whole input.
    #[serde(default)]
    pub rows_per_batch: usize,

    /// Time units per second of this process. Written into every stream, and
    /// used on read to rescale ticks coming from a producer with another unit.
    #[serde(default = "default_time_units_per_second")]
    pub time_units_per_second: i64,

    #[serde(default)]
    pub empty_series: EmptySeriesPolicy,

    /// Ignore the conversion mode tag and always decode to a column map.
    #[serde(default)]
    pub force_pair_output: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            rows_per_batch: 0,
            time_units_per_second: default_time_units_per_second(),
            empty_series: EmptySeriesPolicy::default(),
            force_pair_output: false,
        }
    }
}

impl CodecConfig {
    /// Parses a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.time_units_per_second <= 0 {
            return Err(CodecError::Config(format!(
                "time_units_per_second must be positive, got {}",
                self.time_units_per_second
            )));
        }
        Ok(())
    }
}

/// Microseconds, the usual platform default.
fn default_time_units_per_second() -> i64 {
    1_000_000
}
