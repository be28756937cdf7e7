use serde::Deserialize;
use std::collections::HashSet;

use crate::ndr::types::NdrAction;

/// Carrier status codes that permit a re-attempt
pub const RE_ATTEMPT_CODES: [&str; 8] = [
    "EOD-74", "EOD-15", "EOD-104", "EOD-43", "EOD-86", "EOD-11", "EOD-69", "EOD-6",
];

/// Carrier status codes that permit return-to-origin
pub const RTO_CODES: [&str; 2] = ["EOD-777", "EOD-21"];

/// Prior attempts allowed before an action is refused (a 3-attempt ceiling)
pub const MAX_PRIOR_ATTEMPTS: u32 = 2;

/// NSL code allow-lists, one per action.
///
/// Lookups are exact and case-sensitive. Nothing checks that the two lists are
/// disjoint; a code present in both simply permits both actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NslPolicy {
    pub re_attempt_codes: HashSet<String>,
    pub rto_codes: HashSet<String>,
    pub max_prior_attempts: u32,
}

impl Default for NslPolicy {
    fn default() -> Self {
        Self {
            re_attempt_codes: RE_ATTEMPT_CODES.iter().map(|c| c.to_string()).collect(),
            rto_codes: RTO_CODES.iter().map(|c| c.to_string()).collect(),
            max_prior_attempts: MAX_PRIOR_ATTEMPTS,
        }
    }
}

impl NslPolicy {
    pub fn new(
        re_attempt_codes: impl IntoIterator<Item = impl Into<String>>,
        rto_codes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            re_attempt_codes: re_attempt_codes.into_iter().map(Into::into).collect(),
            rto_codes: rto_codes.into_iter().map(Into::into).collect(),
            max_prior_attempts: MAX_PRIOR_ATTEMPTS,
        }
    }

    pub fn allowed_codes(&self, action: NdrAction) -> &HashSet<String> {
        match action {
            NdrAction::ReAttempt => &self.re_attempt_codes,
            NdrAction::PickupReschedule => &self.rto_codes,
        }
    }

    pub fn permits(&self, nsl_code: &str, action: NdrAction) -> bool {
        self.allowed_codes(action).contains(nsl_code)
    }

    /// Every action whose allow-list contains `nsl_code`
    pub fn permitted_actions(&self, nsl_code: &str) -> Vec<NdrAction> {
        NdrAction::ALL
            .into_iter()
            .filter(|action| self.permits(nsl_code, *action))
            .collect()
    }
}
