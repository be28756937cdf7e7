use crate::ndr::{
    policy::NslPolicy,
    types::{NdrAction, Shipment, Verdict, VerdictReason},
};
use tracing::debug;

/// Decides whether an NDR action may be requested for a shipment.
///
/// Verdicts are recomputed on every call; the tracking feed can change the
/// NSL code or attempt count between reads.
#[derive(Debug, Clone, Default)]
pub struct EligibilityChecker {
    policy: NslPolicy,
}

impl EligibilityChecker {
    pub fn new(policy: NslPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &NslPolicy {
        &self.policy
    }

    /// Evaluate one shipment against one action
    ///
    /// Checks run in order and the first failure wins:
    /// 1. The NSL code must be on the action's allow-list
    /// 2. At most `max_prior_attempts` attempts may already have happened
    pub fn evaluate(&self, shipment: &Shipment, action: NdrAction) -> Verdict {
        if !self.policy.permits(&shipment.nsl_code, action) {
            debug!(
                "{} denied for {}: NSL code {} not permitted",
                action, shipment.waybill, shipment.nsl_code
            );
            return Verdict::deny(VerdictReason::NslCodeNotPermitted);
        }

        if shipment.attempt_count > self.policy.max_prior_attempts {
            debug!(
                "{} denied for {}: {} attempts already made",
                action, shipment.waybill, shipment.attempt_count
            );
            return Verdict::deny(VerdictReason::AttemptLimitExceeded);
        }

        Verdict::allow()
    }

    pub fn is_eligible(&self, shipment: &Shipment, action: NdrAction) -> bool {
        self.evaluate(shipment, action).allowed
    }

    /// Actions that can currently be offered for this shipment
    pub fn available_actions(&self, shipment: &Shipment) -> Vec<NdrAction> {
        NdrAction::ALL
            .into_iter()
            .filter(|action| self.is_eligible(shipment, *action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndr::policy::RE_ATTEMPT_CODES;

    fn checker() -> EligibilityChecker {
        EligibilityChecker::new(NslPolicy::default())
    }

    #[test]
    fn test_allowed_codes_within_ceiling() {
        let checker = checker();
        for code in RE_ATTEMPT_CODES {
            for attempts in 0..=2 {
                let shipment = Shipment::new("AWB1", code, attempts);
                assert_eq!(checker.evaluate(&shipment, NdrAction::ReAttempt), Verdict::allow());
            }
        }
    }

    #[test]
    fn test_attempt_ceiling_boundary() {
        let checker = checker();
        let second = Shipment::new("AWB1", "EOD-74", 2);
        let third = Shipment::new("AWB1", "EOD-74", 3);

        assert!(checker.evaluate(&second, NdrAction::ReAttempt).allowed);
        assert_eq!(
            checker.evaluate(&third, NdrAction::ReAttempt),
            Verdict::deny(VerdictReason::AttemptLimitExceeded)
        );
    }

    #[test]
    fn test_rto_code_not_reattemptable() {
        let checker = checker();
        let shipment = Shipment::new("AWB1", "EOD-777", 1);

        assert_eq!(
            checker.evaluate(&shipment, NdrAction::ReAttempt),
            Verdict::deny(VerdictReason::NslCodeNotPermitted)
        );
        assert!(checker.evaluate(&shipment, NdrAction::PickupReschedule).allowed);
    }

    #[test]
    fn test_code_check_wins_over_attempts() {
        let checker = checker();
        let shipment = Shipment::new("AWB1", "EOD-999", 7);
        assert_eq!(
            checker.evaluate(&shipment, NdrAction::PickupReschedule).reason,
            VerdictReason::NslCodeNotPermitted
        );
    }

    #[test]
    fn test_ceiling_shared_by_rto() {
        let checker = checker();
        let shipment = Shipment::new("AWB1", "EOD-21", 3);
        assert_eq!(
            checker.evaluate(&shipment, NdrAction::PickupReschedule).reason,
            VerdictReason::AttemptLimitExceeded
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let checker = checker();
        let shipment = Shipment::new("AWB1", "EOD-15", 1);
        let first = checker.evaluate(&shipment, NdrAction::ReAttempt);
        assert_eq!(first, checker.evaluate(&shipment, NdrAction::ReAttempt));
    }

    #[test]
    fn test_available_actions() {
        let checker = checker();
        assert_eq!(
            checker.available_actions(&Shipment::new("AWB1", "EOD-6", 0)),
            vec![NdrAction::ReAttempt]
        );
        assert!(checker.available_actions(&Shipment::new("AWB1", "EOD-6", 3)).is_empty());
    }

    #[test]
    fn test_configured_ceiling() {
        let mut policy = NslPolicy::default();
        policy.max_prior_attempts = 0;
        let checker = EligibilityChecker::new(policy);
        assert!(checker.is_eligible(&Shipment::new("AWB1", "EOD-74", 0), NdrAction::ReAttempt));
        assert!(!checker.is_eligible(&Shipment::new("AWB1", "EOD-74", 1), NdrAction::ReAttempt));
    }
}
