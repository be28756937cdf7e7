use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ndr-resolver")]
#[command(about = "Resolve courier non-delivery reports: re-attempt or return-to-origin")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which actions each shipment is eligible for
    Evaluate {
        /// Tracking snapshot (JSON array of shipments)
        #[arg(short, long)]
        shipments: String,

        /// Only evaluate this action (RE-ATTEMPT or PICKUP_RESCHEDULE)
        #[arg(short, long)]
        action: Option<String>,

        /// Filter by status bucket (action_required, action_taken, delivered, rto, all)
        #[arg(short, long, default_value = "all")]
        bucket: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Bulk re-attempt the selected shipments
    Reattempt {
        /// Tracking snapshot (JSON array of shipments)
        #[arg(short, long)]
        shipments: String,

        /// Waybills to select (defaults to every shipment in the snapshot)
        #[arg(short, long)]
        waybill: Vec<String>,

        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,

        /// Show the eligible/rejected split without contacting the courier
        #[arg(long)]
        dry_run: bool,
    },

    /// Bulk return-to-origin the selected shipments
    Rto {
        /// Tracking snapshot (JSON array of shipments)
        #[arg(short, long)]
        shipments: String,

        /// Waybills to select (defaults to every shipment in the snapshot)
        #[arg(short, long)]
        waybill: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Show the eligible/rejected split without contacting the courier
        #[arg(long)]
        dry_run: bool,
    },

    /// Submit an action for a single shipment
    Submit {
        /// Waybill of the shipment
        waybill: String,

        /// RE-ATTEMPT or PICKUP_RESCHEDULE
        #[arg(short, long)]
        action: String,

        /// Tracking snapshot (JSON array of shipments)
        #[arg(short, long)]
        shipments: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show whether now is a good time to submit re-attempts
    Advisory,

    /// Show submitted actions and their UPL IDs
    History {
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Look up a single UPL ID
        #[arg(long)]
        upl_id: Option<String>,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Initialize database and show configuration
    Init,
}
