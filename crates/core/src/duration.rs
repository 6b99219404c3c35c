//! Litterbox retention periods

use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// How long Litterbox keeps an upload before deleting it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LitterboxDuration {
    #[default]
    OneHour,
    TwelveHours,
    OneDay,
    ThreeDays,
    OneWeek,
}

impl LitterboxDuration {
    /// Every accepted retention period, shortest first
    pub const ALL: [LitterboxDuration; 5] = [
        LitterboxDuration::OneHour,
        LitterboxDuration::TwelveHours,
        LitterboxDuration::OneDay,
        LitterboxDuration::ThreeDays,
        LitterboxDuration::OneWeek,
    ];

    /// Token sent in the `time` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            LitterboxDuration::OneHour => "1h",
            LitterboxDuration::TwelveHours => "12h",
            LitterboxDuration::OneDay => "24h",
            LitterboxDuration::ThreeDays => "72h",
            LitterboxDuration::OneWeek => "1w",
        }
    }

    /// Retention period as a wall-clock duration
    pub fn as_duration(&self) -> Duration {
        const HOUR: u64 = 60 * 60;
        let hours = match self {
            LitterboxDuration::OneHour => 1,
            LitterboxDuration::TwelveHours => 12,
            LitterboxDuration::OneDay => 24,
            LitterboxDuration::ThreeDays => 72,
            LitterboxDuration::OneWeek => 7 * 24,
        };
        Duration::from_secs(hours * HOUR)
    }
}

impl std::fmt::Display for LitterboxDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LitterboxDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LitterboxDuration::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "Unknown Litterbox duration '{}' (expected one of 1h, 12h, 24h, 72h, 1w)",
                    s
                ))
            })
    }
}
