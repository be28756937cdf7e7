use colored::Colorize;
use std::path::Path;

use crate::error::Result;
use crate::ndr::{NdrAction, Shipment, Verdict};

/// Read a tracking-feed snapshot: a JSON array of shipments
pub fn load_shipments(path: impl AsRef<Path>) -> Result<Vec<Shipment>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Colored verdict cell for tables
pub fn format_verdict(verdict: &Verdict, action: NdrAction) -> String {
    if verdict.allowed {
        "Eligible".green().to_string()
    } else {
        verdict.reason.describe(action).red().to_string()
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_shipments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"waybill":"AWB1","nsl_code":"EOD-74","attempt_count":1,"status_bucket":"action_required"}},
                {{"waybill":"AWB2","nsl_code":"EOD-21","attempt_count":0,"status_bucket":"rto"}}]"#
        )
        .unwrap();

        let shipments = load_shipments(file.path()).unwrap();
        assert_eq!(shipments.len(), 2);
        assert_eq!(shipments[1].nsl_code, "EOD-21");
    }

    #[test]
    fn test_load_shipments_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_shipments(file.path()),
            Err(crate::error::NdrError::JsonError(_))
        ));
    }
}
