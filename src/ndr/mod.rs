pub mod types;
pub mod policy;
pub mod eligibility;
pub mod advisor;
pub mod bulk;

pub use types::{
    ActionRequest, ActionTarget, BulkOutcome, NdrAction, RejectedShipment, Shipment,
    SingleOutcome, StatusBucket, Verdict, VerdictReason,
};
pub use policy::NslPolicy;
pub use eligibility::EligibilityChecker;
pub use advisor::TimeWindowAdvisor;
pub use bulk::{BulkActionOrchestrator, Partition};
