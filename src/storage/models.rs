use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ndr::{BulkOutcome, NdrAction};

/// A gateway submission the carrier accepted, kept so its UPL ID can be
/// checked against the tracking feed later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub correlation_id: String,
    pub action: NdrAction,
    pub waybills: Vec<String>,
    pub rejected_count: usize,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Ledger entry for a bulk outcome; `None` when nothing was submitted.
    ///
    /// Waybills are stored sorted, as held in `BulkOutcome::accepted`, not in
    /// the order they were selected or sent.
    pub fn from_outcome(outcome: &BulkOutcome) -> Option<Self> {
        let correlation_id = outcome.correlation_id.clone()?;
        Some(Self {
            id: 0,
            correlation_id,
            action: outcome.action,
            waybills: outcome.accepted.iter().cloned().collect(),
            rejected_count: outcome.rejected.len(),
            submitted_at: Utc::now(),
        })
    }

    pub fn single(correlation_id: String, action: NdrAction, waybill: String) -> Self {
        Self {
            id: 0,
            correlation_id,
            action,
            waybills: vec![waybill],
            rejected_count: 0,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndr::RejectedShipment;
    use crate::ndr::VerdictReason;
    use std::collections::BTreeSet;

    #[test]
    fn test_from_outcome_keeps_waybills_sorted() {
        let outcome = BulkOutcome {
            action: NdrAction::ReAttempt,
            correlation_id: Some("UPL-5".to_string()),
            accepted: ["AWB9", "AWB1", "AWB5"].iter().map(|w| w.to_string()).collect(),
            rejected: vec![RejectedShipment {
                waybill: "AWB3".to_string(),
                reason: VerdictReason::AttemptLimitExceeded,
            }],
        };

        let record = SubmissionRecord::from_outcome(&outcome).unwrap();
        assert_eq!(record.waybills, vec!["AWB1", "AWB5", "AWB9"]);
        assert_eq!(record.rejected_count, 1);
    }

    #[test]
    fn test_from_outcome_skips_unsubmitted() {
        let outcome = BulkOutcome {
            action: NdrAction::PickupReschedule,
            correlation_id: None,
            accepted: BTreeSet::new(),
            rejected: vec![],
        };
        assert!(SubmissionRecord::from_outcome(&outcome).is_none());
    }
}
