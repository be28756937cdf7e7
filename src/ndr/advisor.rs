use chrono::{DateTime, TimeZone, Timelike};

use crate::error::{NdrError, Result};
use crate::ndr::types::NdrAction;

/// Local hour after which re-attempts are recommended
pub const DEFAULT_CUTOFF_HOUR: u32 = 21;

/// Advises when re-attempt submissions should go out.
///
/// The courier drops re-attempts for AWBs that have not yet returned to the
/// origin facility, so bulk re-attempts are best sent after the evening
/// cutoff. Never blocks an action; callers surface the advice and may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowAdvisor {
    cutoff_hour: u32,
}

impl Default for TimeWindowAdvisor {
    fn default() -> Self {
        Self { cutoff_hour: DEFAULT_CUTOFF_HOUR }
    }
}

impl TimeWindowAdvisor {
    pub fn new(cutoff_hour: u32) -> Result<Self> {
        if cutoff_hour > 23 {
            return Err(NdrError::Validation(format!(
                "cutoff hour must be between 0 and 23, got {}",
                cutoff_hour
            )));
        }
        Ok(Self { cutoff_hour })
    }

    pub fn cutoff_hour(&self) -> u32 {
        self.cutoff_hour
    }

    /// Only re-attempts are time sensitive
    pub fn applies_to(&self, action: NdrAction) -> bool {
        action == NdrAction::ReAttempt
    }

    /// True at or after the cutoff hour of `now`'s local day
    pub fn is_recommended_time<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        now.hour() >= self.cutoff_hour
    }

    pub fn recommendation_message<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String {
        let cutoff = format_hour(self.cutoff_hour);
        if self.is_recommended_time(now) {
            format!(
                "It is past {}. Undelivered AWBs of today should be back at the facility, re-attempts can be submitted now.",
                cutoff
            )
        } else {
            format!(
                "It is recommended to bulk re-attempt after {} to ensure undelivered AWBs of today have returned to the facility.",
                cutoff
            )
        }
    }
}

fn format_hour(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{} {}", display, suffix)
}
