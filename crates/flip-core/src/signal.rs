//! Signal and instrument types.
//!
//! A signal selects which of the two opposing instruments is entered and
//! which one is unwound.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Directional trading signal received over the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Long,
    Short,
}

impl Signal {
    /// Returns `(entry, exit)` instruments for this signal.
    ///
    /// Long enters the long-biased instrument and unwinds the short-biased
    /// one; Short does the reverse.
    pub fn instruments(&self) -> (Instrument, Instrument) {
        let entry = match self {
            Self::Long => Instrument::Long,
            Self::Short => Instrument::Short,
        };
        (entry, entry.opposite())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = CoreError;

    /// Case-insensitive parse of `"long"` / `"short"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(CoreError::UnknownSignal(other.to_string())),
        }
    }
}

/// One of the two fixed, oppositely-moving instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Long-biased instrument (entered on a long signal).
    Long,
    /// Short-biased instrument (entered on a short signal).
    Short,
}

impl Instrument {
    /// Returns the opposing instrument.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Ticker symbols for the two instruments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPair {
    /// Symbol of the long-biased instrument.
    #[serde(default = "default_long_symbol")]
    pub long: String,
    /// Symbol of the short-biased instrument.
    #[serde(default = "default_short_symbol")]
    pub short: String,
}

fn default_long_symbol() -> String {
    "MSTU".to_string()
}

fn default_short_symbol() -> String {
    "MSTZ".to_string()
}

impl Default for InstrumentPair {
    fn default() -> Self {
        Self {
            long: default_long_symbol(),
            short: default_short_symbol(),
        }
    }
}

impl InstrumentPair {
    pub fn new(long: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            long: long.into(),
            short: short.into(),
        }
    }

    /// Symbol traded for `instrument`.
    pub fn symbol(&self, instrument: Instrument) -> &str {
        match instrument {
            Instrument::Long => &self.long,
            Instrument::Short => &self.short,
        }
    }

    /// Reject empty or identical symbols.
    pub fn validate(&self) -> crate::Result<()> {
        if self.long.trim().is_empty() || self.short.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "instrument symbols must not be empty".to_string(),
            ));
        }
        if self.long.eq_ignore_ascii_case(&self.short) {
            return Err(CoreError::InvalidConfig(format!(
                "long and short instruments must differ (both are {})",
                self.long
            )));
        }
        Ok(())
    }
}
