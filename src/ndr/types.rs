use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{NdrError, Result};

/// Courier-facing remedy for a failed delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NdrAction {
    /// Ask the courier to attempt delivery again
    #[serde(rename = "RE-ATTEMPT")]
    ReAttempt,
    /// Initiate return-to-origin
    #[serde(rename = "PICKUP_RESCHEDULE")]
    PickupReschedule,
}

impl NdrAction {
    pub const ALL: [NdrAction; 2] = [NdrAction::ReAttempt, NdrAction::PickupReschedule];

    /// Wire spelling expected by the courier API
    pub fn as_str(&self) -> &'static str {
        match self {
            NdrAction::ReAttempt => "RE-ATTEMPT",
            NdrAction::PickupReschedule => "PICKUP_RESCHEDULE",
        }
    }
}

impl fmt::Display for NdrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NdrAction {
    type Err = NdrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RE-ATTEMPT" => Ok(NdrAction::ReAttempt),
            "PICKUP_RESCHEDULE" => Ok(NdrAction::PickupReschedule),
            other => Err(NdrError::Validation(format!(
                "unsupported action '{}' (expected RE-ATTEMPT or PICKUP_RESCHEDULE)",
                other
            ))),
        }
    }
}

/// Dashboard bucket a shipment is listed under. Classified upstream; only read here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    #[default]
    ActionRequired,
    ActionTaken,
    Delivered,
    Rto,
    All,
}

impl StatusBucket {
    /// Whether a shipment in `self` is shown when filtering by `filter`
    pub fn matches(&self, filter: StatusBucket) -> bool {
        filter == StatusBucket::All || *self == filter
    }
}

impl FromStr for StatusBucket {
    type Err = NdrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "action_required" => Ok(StatusBucket::ActionRequired),
            "action_taken" => Ok(StatusBucket::ActionTaken),
            "delivered" => Ok(StatusBucket::Delivered),
            "rto" => Ok(StatusBucket::Rto),
            "all" => Ok(StatusBucket::All),
            other => Err(NdrError::Validation(format!("unknown status bucket '{}'", other))),
        }
    }
}

/// Snapshot of one undelivered shipment as reported by the tracking feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub waybill: String,
    pub nsl_code: String,
    pub attempt_count: u32,
    #[serde(default)]
    pub status_bucket: StatusBucket,
}

impl Shipment {
    pub fn new(waybill: impl Into<String>, nsl_code: impl Into<String>, attempt_count: u32) -> Self {
        Self {
            waybill: waybill.into(),
            nsl_code: nsl_code.into(),
            attempt_count,
            status_bucket: StatusBucket::ActionRequired,
        }
    }
}

/// Machine reason attached to every verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    Ok,
    NslCodeNotPermitted,
    AttemptLimitExceeded,
}

impl VerdictReason {
    /// Operator-facing text for the reason
    pub fn describe(&self, action: NdrAction) -> String {
        match self {
            VerdictReason::Ok => format!("{} allowed", action),
            VerdictReason::NslCodeNotPermitted => {
                format!("Current NDR status does not permit {}", action)
            }
            VerdictReason::AttemptLimitExceeded => {
                "Delivery attempt limit already reached".to_string()
            }
        }
    }
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerdictReason::Ok => "ok",
            VerdictReason::NslCodeNotPermitted => "nsl_code_not_permitted",
            VerdictReason::AttemptLimitExceeded => "attempt_limit_exceeded",
        };
        f.write_str(s)
    }
}

/// Result of evaluating one (shipment, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: VerdictReason,
}

impl Verdict {
    pub fn allow() -> Self {
        Self { allowed: true, reason: VerdictReason::Ok }
    }

    pub fn deny(reason: VerdictReason) -> Self {
        Self { allowed: false, reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    Single(String),
    Bulk(Vec<String>),
}

/// One unit of work for the action gateway. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    action: NdrAction,
    target: ActionTarget,
}

impl ActionRequest {
    pub fn single(action: NdrAction, waybill: impl Into<String>) -> Result<Self> {
        let waybill = waybill.into();
        if waybill.trim().is_empty() {
            return Err(NdrError::Validation("waybill must not be empty".to_string()));
        }
        Ok(Self { action, target: ActionTarget::Single(waybill) })
    }

    pub fn bulk(action: NdrAction, waybills: Vec<String>) -> Result<Self> {
        if waybills.is_empty() {
            return Err(NdrError::Validation(
                "bulk action requires at least one shipment".to_string(),
            ));
        }
        if waybills.iter().any(|w| w.trim().is_empty()) {
            return Err(NdrError::Validation("waybill must not be empty".to_string()));
        }
        Ok(Self { action, target: ActionTarget::Bulk(waybills) })
    }

    pub fn action(&self) -> NdrAction {
        self.action
    }

    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    pub fn len(&self) -> usize {
        match &self.target {
            ActionTarget::Single(_) => 1,
            ActionTarget::Bulk(waybills) => waybills.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedShipment {
    pub waybill: String,
    pub reason: VerdictReason,
}

/// Consolidated result of one bulk submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub action: NdrAction,
    pub correlation_id: Option<String>,
    pub accepted: BTreeSet<String>,
    pub rejected: Vec<RejectedShipment>,
}

impl BulkOutcome {
    pub fn summary(&self) -> String {
        match &self.correlation_id {
            Some(id) => format!(
                "{}: {} accepted, {} rejected (UPL ID {})",
                self.action,
                self.accepted.len(),
                self.rejected.len(),
                id
            ),
            None => format!(
                "{}: nothing submitted, {} rejected",
                self.action,
                self.rejected.len()
            ),
        }
    }
}

/// Result of a single-shipment action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SingleOutcome {
    Submitted { correlation_id: String },
    Denied { reason: VerdictReason },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!("RE-ATTEMPT".parse::<NdrAction>().unwrap(), NdrAction::ReAttempt);
        assert_eq!(
            "PICKUP_RESCHEDULE".parse::<NdrAction>().unwrap(),
            NdrAction::PickupReschedule
        );
        assert_eq!(
            serde_json::to_string(&NdrAction::ReAttempt).unwrap(),
            "\"RE-ATTEMPT\""
        );
    }

    #[test]
    fn test_unknown_action_is_validation_error() {
        let err = "re-attempt".parse::<NdrAction>().unwrap_err();
        assert!(matches!(err, NdrError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_bucket_filter() {
        assert!(StatusBucket::Rto.matches(StatusBucket::All));
        assert!(StatusBucket::Rto.matches(StatusBucket::Rto));
        assert!(!StatusBucket::Delivered.matches(StatusBucket::ActionRequired));
    }

    #[test]
    fn test_shipment_bucket_defaults_when_missing() {
        let shipment: Shipment =
            serde_json::from_str(r#"{"waybill":"AWB1","nsl_code":"EOD-74","attempt_count":1}"#)
                .unwrap();
        assert_eq!(shipment.status_bucket, StatusBucket::ActionRequired);
    }

    #[test]
    fn test_empty_bulk_request_rejected() {
        let err = ActionRequest::bulk(NdrAction::ReAttempt, vec![]).unwrap_err();
        assert!(matches!(err, NdrError::Validation(_)));
        assert!(ActionRequest::single(NdrAction::ReAttempt, "  ").is_err());
        assert!(ActionRequest::bulk(NdrAction::ReAttempt, vec!["AWB1".into(), "".into()]).is_err());
    }
}
