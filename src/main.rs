mod cli;

use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use indicatif::ProgressBar;
use ndr_resolver::{
    config::Config,
    error::{self, NdrError},
    gateway::HttpActionGateway,
    ndr::{BulkActionOrchestrator, BulkOutcome, NdrAction, Shipment, SingleOutcome, StatusBucket},
    storage::{Database, SubmissionRecord},
    utils,
};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ndr_resolver=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Evaluate { shipments, action, bucket, format } => {
            evaluate(&config, &shipments, action.as_deref(), &bucket, &format)
        }

        Commands::Reattempt { shipments, waybill, yes, dry_run } => {
            info!("Bulk re-attempt requested");
            run_bulk(&config, NdrAction::ReAttempt, &shipments, &waybill, yes, dry_run).await
        }

        Commands::Rto { shipments, waybill, yes, dry_run } => {
            info!("Bulk RTO requested");
            run_bulk(&config, NdrAction::PickupReschedule, &shipments, &waybill, yes, dry_run).await
        }

        Commands::Submit { waybill, action, shipments, yes } => {
            submit_single(&config, &waybill, &action, &shipments, yes).await
        }

        Commands::Advisory => show_advisory(&config),

        Commands::History { limit, upl_id, format } => {
            show_history(&config, limit, upl_id.as_deref(), &format)
        }

        Commands::Init => initialize(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        if e.is_retryable() {
            error!("The courier did not confirm the request. Check the tracking feed before retrying the same selection.");
        }
        std::process::exit(1);
    }
}

fn evaluate(
    config: &Config,
    path: &str,
    action: Option<&str>,
    bucket: &str,
    format: &str,
) -> error::Result<()> {
    let checker = config.eligibility_checker();
    let bucket: StatusBucket = bucket.parse()?;
    let actions = match action {
        Some(a) => vec![a.parse::<NdrAction>()?],
        None => NdrAction::ALL.to_vec(),
    };

    let shipments: Vec<Shipment> = utils::load_shipments(path)?
        .into_iter()
        .filter(|s| s.status_bucket.matches(bucket))
        .collect();

    if format == "json" {
        let checker = &checker;
        let rows: Vec<serde_json::Value> = shipments
            .iter()
            .flat_map(|s| {
                actions.iter().map(move |action| {
                    serde_json::json!({
                        "waybill": s.waybill,
                        "action": action,
                        "verdict": checker.evaluate(s, *action),
                    })
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", "=== NDR Eligibility ===".cyan().bold());
    utils::print_table_border(100);
    utils::print_table_row(&["Waybill", "NSL Code", "Attempts", "Action", "Verdict"], &[20, 10, 8, 18, 40]);
    utils::print_table_border(100);

    for shipment in &shipments {
        for action in &actions {
            let verdict = checker.evaluate(shipment, *action);
            utils::print_table_row(
                &[
                    &shipment.waybill,
                    &shipment.nsl_code,
                    &shipment.attempt_count.to_string(),
                    action.as_str(),
                    &utils::format_verdict(&verdict, *action),
                ],
                &[20, 10, 8, 18, 40],
            );
        }
    }
    utils::print_table_border(100);
    println!("{} shipments evaluated", shipments.len());

    Ok(())
}

/// Pick the selected waybills out of the snapshot, keeping selection order
fn select(shipments: Vec<Shipment>, waybills: &[String]) -> Vec<Shipment> {
    if waybills.is_empty() {
        return shipments;
    }

    waybills
        .iter()
        .filter_map(|w| {
            let found = shipments.iter().find(|s| &s.waybill == w).cloned();
            if found.is_none() {
                warn!("Waybill {} is not in the tracking snapshot", w);
            }
            found
        })
        .collect()
}

/// Surface the time-window advisory; false if the operator backs out
fn check_time_window(config: &Config, action: NdrAction, yes: bool) -> error::Result<bool> {
    let advisor = config.advisor()?;
    if !advisor.applies_to(action) {
        return Ok(true);
    }

    let now = Local::now();
    if advisor.is_recommended_time(&now) {
        return Ok(true);
    }

    println!("{}", advisor.recommendation_message(&now).yellow());
    if yes {
        warn!("Submitting {} outside the recommended window", action);
        return Ok(true);
    }
    Ok(utils::confirm_action("Submit anyway?"))
}

async fn run_bulk(
    config: &Config,
    action: NdrAction,
    path: &str,
    waybills: &[String],
    yes: bool,
    dry_run: bool,
) -> error::Result<()> {
    let selection = select(utils::load_shipments(path)?, waybills);
    let orchestrator =
        BulkActionOrchestrator::new(config.eligibility_checker(), HttpActionGateway::new(&config.gateway)?);

    let plan = orchestrator.partition(&selection, action);
    println!(
        "{} selected: {} eligible, {} not eligible for {}",
        selection.len(),
        plan.eligible.len().to_string().green(),
        plan.rejected.len().to_string().red(),
        action
    );

    if dry_run {
        println!("\n{}", "DRY RUN: nothing will be sent to the courier".yellow());
        for rejected in &plan.rejected {
            println!("  ✗ {} - {}", rejected.waybill, rejected.reason.describe(action));
        }
        return Ok(());
    }

    if !plan.eligible.is_empty() {
        if !check_time_window(config, action, yes)? {
            println!("Cancelled");
            return Ok(());
        }
        if !yes && !utils::confirm_action(&format!("Submit {} for {} shipments?", action, plan.eligible.len())) {
            println!("Cancelled");
            return Ok(());
        }
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Submitting {}...", action));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = orchestrator.submit_bulk(&selection, action).await;
    spinner.finish_and_clear();

    let outcome = result?;
    info!("{}", outcome.summary());
    print_outcome(&outcome);

    if let Some(record) = SubmissionRecord::from_outcome(&outcome) {
        let db = Database::new(&config.database.path)?;
        db.save_submission(&record)?;
        info!("Submission {} saved to ledger", record.correlation_id);
    }

    Ok(())
}

fn print_outcome(outcome: &BulkOutcome) {
    println!("\n{}", "=== Bulk Action Summary ===".cyan().bold());
    match &outcome.correlation_id {
        Some(id) => {
            println!("Accepted:  {} ✓", outcome.accepted.len().to_string().green());
            println!("UPL ID:    {}", id.yellow());
        }
        None => println!("{}", "No eligible shipments, nothing was submitted".yellow()),
    }
    println!("Rejected:  {} ✗", outcome.rejected.len());

    for rejected in &outcome.rejected {
        println!("  ✗ {} - {}", rejected.waybill, rejected.reason.describe(outcome.action));
    }
}

async fn submit_single(
    config: &Config,
    waybill: &str,
    action: &str,
    path: &str,
    yes: bool,
) -> error::Result<()> {
    let action: NdrAction = action.parse()?;
    let shipment = utils::load_shipments(path)?
        .into_iter()
        .find(|s| s.waybill == waybill)
        .ok_or_else(|| NdrError::Validation(format!("waybill {} not found in snapshot", waybill)))?;

    let orchestrator =
        BulkActionOrchestrator::new(config.eligibility_checker(), HttpActionGateway::new(&config.gateway)?);

    let verdict = orchestrator.checker().evaluate(&shipment, action);
    if verdict.allowed {
        if !check_time_window(config, action, yes)? {
            println!("Cancelled");
            return Ok(());
        }
        if !yes && !utils::confirm_action(&format!("Submit {} for {}?", action, waybill)) {
            println!("Cancelled");
            return Ok(());
        }
    }

    match orchestrator.submit_single(&shipment, action).await? {
        SingleOutcome::Submitted { correlation_id } => {
            println!("✓ {} submitted for {}", action, waybill);
            println!("UPL ID: {}", correlation_id.yellow());

            let db = Database::new(&config.database.path)?;
            db.save_submission(&SubmissionRecord::single(correlation_id, action, waybill.to_string()))?;
        }
        SingleOutcome::Denied { reason } => {
            println!("{} {}", "✗".red(), reason.describe(action));
        }
    }

    Ok(())
}

fn show_advisory(config: &Config) -> error::Result<()> {
    let advisor = config.advisor()?;
    let now = Local::now();
    let message = advisor.recommendation_message(&now);

    if advisor.is_recommended_time(&now) {
        println!("{}", message.green());
    } else {
        println!("{}", message.yellow());
    }
    Ok(())
}

fn show_history(config: &Config, limit: Option<usize>, upl_id: Option<&str>, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;

    let history: Vec<SubmissionRecord> = match upl_id {
        Some(id) => db.find_by_correlation_id(id)?.into_iter().collect(),
        None => db.get_submission_history(limit.or(Some(20)))?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    let stats = db.get_stats()?;
    println!("{}", "=== NDR Submissions ===".cyan().bold());
    println!("  Total:       {}", stats.total_submissions);
    println!("  Re-attempts: {}", stats.re_attempt_submissions.to_string().green());
    println!("  RTO:         {}", stats.rto_submissions.to_string().yellow());
    println!("  Shipments:   {}", stats.total_shipments);

    if history.is_empty() {
        println!("\nNo submissions recorded");
        return Ok(());
    }

    println!();
    utils::print_table_border(90);
    utils::print_table_row(&["Submitted", "UPL ID", "Action", "Shipments", "Rejected"], &[24, 24, 18, 10, 8]);
    utils::print_table_border(90);
    for record in &history {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&record.submitted_at),
                &record.correlation_id,
                record.action.as_str(),
                &record.waybills.len().to_string(),
                &record.rejected_count.to_string(),
            ],
            &[24, 24, 18, 10, 8],
        );
    }
    utils::print_table_border(90);

    Ok(())
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing NDR resolver...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());

    let mut re_attempt: Vec<&String> = config.policy.re_attempt_codes.iter().collect();
    re_attempt.sort();
    let mut rto: Vec<&String> = config.policy.rto_codes.iter().collect();
    rto.sort();

    println!("\n{}", "Configuration:".cyan());
    println!("  Gateway:          {}", config.gateway.base_url);
    println!("  Timeout:          {}s", config.gateway.timeout_secs);
    println!("  Re-attempt codes: {:?}", re_attempt);
    println!("  RTO codes:        {:?}", rto);
    println!("  Max attempts:     {}", config.policy.max_prior_attempts + 1);
    println!("  Re-attempt after: {:02}:00 local", config.advisory.cutoff_hour);
    println!("  Database:         {}", config.database.path);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to check eligibility", "ndr-resolver evaluate -s shipments.json".yellow());
    println!("  {} to bulk re-attempt", "ndr-resolver reattempt -s shipments.json".yellow());
    println!("  {} to view submissions", "ndr-resolver history".yellow());
    Ok(())
}
