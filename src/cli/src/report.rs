//! Operator-facing run summary output.
//!
//! Diagnostics go through `tracing`; the lines an operator greps a
//! CronJob log for are printed here.

use comfy_table::{ContentArrangement, Table};

use krar_core::{Mode, RunConfig};
use krar_runtime::RunSummary;

/// Create a styled table with the given headers.
fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Shorten a sha256 digest for table display.
fn short_digest(digest: &str) -> String {
    match digest.strip_prefix("sha256:") {
        Some(hex) if hex.len() > 12 => format!("sha256:{}", &hex[..12]),
        _ => digest.to_string(),
    }
}

/// Print the summary for one run.
pub fn print_summary(config: &RunConfig, summary: &RunSummary) {
    if summary.targets.is_empty() {
        println!("nothing to do");
        return;
    }

    if config.mode == Mode::Smart {
        if summary.pairs.is_empty() {
            println!("no eligible images to check");
            return;
        }

        let mut table = new_table(&["IMAGE", "LOCAL DIGEST", "REMOTE DIGEST", "STATUS"]);
        for pair in &summary.pairs {
            let status = if pair.drifted {
                "drifted"
            } else if pair.remote.is_empty() {
                "unknown"
            } else {
                "up-to-date"
            };
            table.add_row([
                pair.image.clone(),
                short_digest(&pair.local),
                short_digest(&pair.remote),
                status.to_string(),
            ]);
        }
        println!("{table}");

        if summary.drifted_images.is_empty() {
            println!("no drift detected");
            return;
        }
        for candidate in &summary.candidates {
            println!("drifted: {candidate}");
        }
    }

    for target in &summary.would_restart {
        println!("would restart {target}");
    }
    for target in &summary.restarted {
        println!("restarted {target}");
    }
}
