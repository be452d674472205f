//! HTTP file generator - converts failed scenarios to .http format

use crate::dump::mask_headers;
use crate::exchange::HttpRequest;
use crate::model::JSON;
use crate::verdict::ScenarioReport;

/// Headers that never belong in a hand-replayed request.
fn is_transport_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "host" | "content-length"
    )
}

/// Generate .http file content from failed scenarios.
///
/// Scenarios that passed, or that failed before any request was assembled,
/// are skipped. A URL under `base_url` is rewritten to use the
/// `{{base_url_var}}` variable so the file can target another environment.
pub fn to_http_file(scenarios: &[ScenarioReport], base_url: &str, base_url_var: &str) -> String {
    let failed: Vec<_> = scenarios
        .iter()
        .filter(|s| !s.outcome.is_pass())
        .filter_map(|s| s.last_request.as_ref().map(|r| (s, r)))
        .collect();

    let mut lines = Vec::new();

    lines.push(format!(
        "# Auto-generated reproduction cases ({} failures)",
        failed.len()
    ));
    lines.push(format!("@{base_url_var} = {base_url}"));
    lines.push(String::new());

    for (idx, (scenario, request)) in failed.iter().enumerate() {
        let kind = scenario
            .outcome
            .kind()
            .map_or("unknown", |k| k.as_str());
        lines.push(format!("### [{idx}] {} - {kind}", scenario.name));

        let url = match request.url.strip_prefix(base_url.trim_end_matches('/')) {
            Some(rest) if !base_url.is_empty() => format!("{{{{{base_url_var}}}}}{rest}"),
            _ => request.url.clone(),
        };
        lines.push(format!("{} {url}", request.method));

        for (key, value) in &mask_headers(&request.headers) {
            if !is_transport_header(key) {
                lines.push(format!("{key}: {value}"));
            }
        }

        if let Some(body) = &request.body {
            let has_content_type = request
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                lines.push(format!("Content-Type: {JSON}"));
            }
            lines.push(String::new());
            lines.push(body.clone());
        }

        lines.push(String::new());
    }

    lines.join("\n")
}

/// Generate a single request as .http format
pub fn request_to_http(request: &HttpRequest, comment: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(c) = comment {
        lines.push(format!("### {c}"));
    }

    lines.push(format!("{} {}", request.method, request.url));

    for (key, value) in &mask_headers(&request.headers) {
        lines.push(format!("{key}: {value}"));
    }

    if let Some(body) = &request.body {
        lines.push(String::new());
        lines.push(body.clone());
    }

    lines.join("\n")
}
