//! Persistent run reports under `<output_dir>/reports/`
//!
//! Every `apicontract run` is saved regardless of `--output` mode.
//! Directory layout: `{host_port}_{timestamp}/`

use std::path::{Path, PathBuf};

use apicontract_core::{Config, SuiteReport, Verdict, to_http_file};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Everything needed to persist a run.
pub struct ReportData<'a> {
    pub config: &'a Config,
    pub report: &'a SuiteReport,
    pub verdict: &'a Verdict,
    pub duration_secs: f64,
}

/// Save a run to `<output_dir>/reports/{host_port}_{timestamp}/`.
///
/// Returns the report directory path on success.
pub fn save_report(output_dir: &Path, data: &ReportData) -> Result<PathBuf, std::io::Error> {
    let now = OffsetDateTime::now_utc();
    let report_dir = output_dir
        .join("reports")
        .join(build_dir_name(&data.config.base_url, now));
    std::fs::create_dir_all(&report_dir)?;

    // summary.json: verdict + per-scenario outcomes + metadata
    let summary = serde_json::json!({
        "verdict": {
            "status": data.verdict.status.to_string(),
            "exit_code": data.verdict.exit_code,
            "reason": data.verdict.reason,
        },
        "report": data.report,
        "meta": {
            "timestamp": now.format(&Rfc3339).unwrap_or_default(),
            "duration_secs": data.duration_secs,
            "base_url": data.config.base_url,
        },
    });
    let summary = serde_json::to_string_pretty(&summary).map_err(std::io::Error::other)?;
    std::fs::write(report_dir.join("summary.json"), summary)?;

    // reproductions.http: for quick replay in IDE/curl
    if data.report.failed > 0 {
        let http_content = to_http_file(&data.report.scenarios, &data.config.base_url, "base_url");
        std::fs::write(report_dir.join("reproductions.http"), http_content)?;
    }

    Ok(report_dir)
}

/// `{host_port}_{timestamp}` e.g. `reqres.in_20260205T193000`
fn build_dir_name(base_url: &str, now: OffsetDateTime) -> String {
    format!("{}_{}", extract_host_port(base_url), timestamp_compact(now))
}

/// `"http://localhost:8080/path"` → `"localhost_8080"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .replace(':', "_")
}

/// `"20260205T193000"`, filesystem-safe.
fn timestamp_compact(now: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
