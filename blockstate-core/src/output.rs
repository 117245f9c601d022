use anyhow::{Context, Result};
use blockstate_states::RunReport;

/// Render a run report as pretty JSON or as one block per state plus a summary.
pub fn render(report: &RunReport, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(report).context("Failed to serialize results");
    }

    let mut out = String::new();
    for result in &report.results {
        out.push_str(&result.to_string());
        out.push('\n');
    }
    out.push_str(&format!(
        "Summary{}: {} succeeded ({} changed), {} failed, {} pending\n",
        if report.dry_run { " (test mode)" } else { "" },
        report.succeeded(),
        report.changed(),
        report.failed(),
        report.pending(),
    ));
    Ok(out)
}
