use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

use crate::{
    error::{NdrError, Result},
    gateway::ActionGateway,
    ndr::{
        eligibility::EligibilityChecker,
        types::{
            ActionRequest, ActionTarget, BulkOutcome, NdrAction, RejectedShipment, Shipment,
            SingleOutcome,
        },
    },
};

/// Eligible/rejected split of a selection for one action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub eligible: Vec<String>,
    pub rejected: Vec<RejectedShipment>,
}

/// Applies NDR actions to single shipments and to multi-select batches.
///
/// Eligibility is settled entirely before the gateway is touched, and a batch
/// goes out as a single gateway call no matter how many shipments it holds.
pub struct BulkActionOrchestrator<G: ActionGateway> {
    checker: EligibilityChecker,
    gateway: G,
}

impl<G: ActionGateway> BulkActionOrchestrator<G> {
    pub fn new(checker: EligibilityChecker, gateway: G) -> Self {
        Self { checker, gateway }
    }

    pub fn checker(&self) -> &EligibilityChecker {
        &self.checker
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Split `selection` into eligible waybills and rejected items.
    ///
    /// Selection order is kept. A waybill listed twice is judged once, on its
    /// first occurrence.
    pub fn partition(&self, selection: &[Shipment], action: NdrAction) -> Partition {
        let mut seen = HashSet::new();
        let mut partition = Partition::default();

        for shipment in selection {
            if !seen.insert(shipment.waybill.as_str()) {
                continue;
            }
            let verdict = self.checker.evaluate(shipment, action);
            if verdict.allowed {
                partition.eligible.push(shipment.waybill.clone());
            } else {
                partition.rejected.push(RejectedShipment {
                    waybill: shipment.waybill.clone(),
                    reason: verdict.reason,
                });
            }
        }

        partition
    }

    /// Submit `action` for every eligible shipment in `selection`
    pub async fn submit_bulk(&self, selection: &[Shipment], action: NdrAction) -> Result<BulkOutcome> {
        if selection.is_empty() {
            return Err(NdrError::Validation(
                "no shipments selected for bulk action".to_string(),
            ));
        }
        if let Some(blank) = selection.iter().position(|s| s.waybill.trim().is_empty()) {
            return Err(NdrError::Validation(format!(
                "shipment #{} in the selection has an empty waybill",
                blank + 1
            )));
        }

        let Partition { eligible, rejected } = self.partition(selection, action);
        info!(
            "{} batch: {} eligible, {} rejected",
            action,
            eligible.len(),
            rejected.len()
        );

        if eligible.is_empty() {
            info!("No eligible shipments for {}, skipping gateway", action);
            return Ok(BulkOutcome {
                action,
                correlation_id: None,
                accepted: BTreeSet::new(),
                rejected,
            });
        }

        let request = ActionRequest::bulk(action, eligible)?;
        let correlation_id = self.gateway.submit(&request).await.map_err(|e| {
            warn!("Bulk {} submission failed: {}", action, e);
            NdrError::from(e)
        })?;

        info!(
            "✓ Bulk {} accepted for {} shipments | UPL ID: {}",
            action,
            request.len(),
            correlation_id
        );

        let accepted = match request.target() {
            ActionTarget::Bulk(waybills) => waybills.iter().cloned().collect(),
            ActionTarget::Single(waybill) => BTreeSet::from([waybill.clone()]),
        };

        Ok(BulkOutcome {
            action,
            correlation_id: Some(correlation_id),
            accepted,
            rejected,
        })
    }

    /// Submit `action` for one shipment
    ///
    /// A policy denial comes back as `SingleOutcome::Denied` without a gateway call.
    pub async fn submit_single(&self, shipment: &Shipment, action: NdrAction) -> Result<SingleOutcome> {
        let verdict = self.checker.evaluate(shipment, action);
        if !verdict.allowed {
            return Ok(SingleOutcome::Denied { reason: verdict.reason });
        }

        let request = ActionRequest::single(action, shipment.waybill.clone())?;
        let correlation_id = self.gateway.submit(&request).await.map_err(|e| {
            warn!("{} submission for {} failed: {}", action, shipment.waybill, e);
            NdrError::from(e)
        })?;

        info!("✓ {} accepted for {} | UPL ID: {}", action, shipment.waybill, correlation_id);
        Ok(SingleOutcome::Submitted { correlation_id })
    }
}
