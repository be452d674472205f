//! Full request/response dump to JSONL files
//!
//! Writes every exchange of a run to per-endpoint JSONL files for post-hoc
//! debugging.
//!
//! ```text
//! .apicontract/dumps/
//! ├── GET__api_unknown.jsonl
//! ├── POST__api_register.jsonl
//! └── index.json
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::exchange::{Exchange, HttpRequest};
use crate::response::ResponseHandle;

/// Headers that should be masked in dumps for security.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
const MASK: &str = "***";

/// Summary of a dump, written as `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpIndex {
    /// Total exchanges dumped
    pub total: u64,
    /// Per-endpoint file listing
    pub operations: Vec<DumpOperationEntry>,
    /// Directory where files were written
    pub dump_dir: PathBuf,
}

/// An entry in the dump index for one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpOperationEntry {
    /// Operation label, e.g. "POST /api/register"
    pub operation: String,
    /// Filename within dump directory
    pub file: String,
    /// Number of exchanges in this file
    pub count: u64,
}

/// Write all exchanges to per-endpoint JSONL files.
///
/// # Errors
///
/// Returns error if dump directory cannot be created or files cannot be written.
pub fn write_dump(
    exchanges: &[Exchange],
    dump_dir: &Path,
    mask_headers: bool,
) -> Result<DumpIndex, DumpError> {
    std::fs::create_dir_all(dump_dir)
        .map_err(|e| DumpError::Io(format!("create {}: {e}", dump_dir.display())))?;

    // BTreeMap keeps the index deterministic
    let mut groups: BTreeMap<String, Vec<&Exchange>> = BTreeMap::new();
    for exchange in exchanges {
        groups
            .entry(exchange.request.operation())
            .or_default()
            .push(exchange);
    }

    let mut entries = Vec::new();
    let mut total: u64 = 0;

    for (operation, exchanges) in groups {
        let filename = sanitize_filename(&operation);
        let filepath = dump_dir.join(&filename);

        let file = std::fs::File::create(&filepath)
            .map_err(|e| DumpError::Io(format!("create {}: {e}", filepath.display())))?;
        let mut writer = std::io::BufWriter::new(file);

        let count = exchanges.len() as u64;
        total += count;

        for exchange in exchanges {
            let line = if mask_headers {
                serde_json::to_string(&mask_exchange(exchange))
            } else {
                serde_json::to_string(exchange)
            }
            .map_err(|e| DumpError::Serialize(e.to_string()))?;
            writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.write_all(b"\n"))
                .map_err(|e| DumpError::Io(format!("write {}: {e}", filepath.display())))?;
        }

        writer
            .flush()
            .map_err(|e| DumpError::Io(format!("flush {}: {e}", filepath.display())))?;

        entries.push(DumpOperationEntry {
            operation,
            file: filename,
            count,
        });
    }

    let index = DumpIndex {
        total,
        operations: entries,
        dump_dir: dump_dir.to_path_buf(),
    };

    let index_path = dump_dir.join("index.json");
    let index_json =
        serde_json::to_string_pretty(&index).map_err(|e| DumpError::Serialize(e.to_string()))?;
    std::fs::write(&index_path, index_json)
        .map_err(|e| DumpError::Io(format!("write {}: {e}", index_path.display())))?;

    Ok(index)
}

/// Maximum characters kept from the operation label in the filename.
const MAX_FILENAME_LEN: usize = 200;

/// Convert an operation label to a safe filename.
///
/// "POST /api/users/2" → "POST__api_users_2.jsonl"
fn sanitize_filename(operation: &str) -> String {
    let sanitized: String = operation
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("{sanitized}.jsonl")
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
/// Whether `name` carries credentials and must not be persisted in clear.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

pub fn mask_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            let value = if is_sensitive_header(k) { MASK } else { v.as_str() };
            (k.clone(), value.to_string())
        })
        .collect()
}

/// Mask sensitive headers on both sides of an exchange.
/// Copy of `request` with sensitive header values replaced.
#[must_use]
pub fn mask_request(request: &HttpRequest) -> HttpRequest {
    HttpRequest {
        headers: mask_headers(&request.headers),
        ..request.clone()
    }
}

fn mask_exchange(exchange: &Exchange) -> Exchange {
    let mut masked = exchange.clone();
    masked.request = mask_request(&exchange.request);
    masked.response = exchange.response.as_ref().map(|r| {
        ResponseHandle::new(r.status(), mask_headers(r.headers()), r.body())
    });
    masked
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{HttpRequest, Method};

    fn exchange(method: Method, url: &str, status: u16) -> Exchange {
        Exchange {
            scenario: "successful_registration_plain".into(),
            request: HttpRequest {
                method,
                url: url.into(),
                headers: BTreeMap::from([
                    ("x-api-key".into(), "reqres-free-v1".into()),
                    ("Content-Type".into(), "application/json".into()),
                ]),
                body: Some(r#"{"email":"eve.holt@reqres.in"}"#.into()),
            },
            response: Some(ResponseHandle::new(
                status,
                BTreeMap::from([("Set-Cookie".into(), "session=abc".into())]),
                r#"{"token":"QpwL5tke4Pnpja7X4"}"#,
            )),
            error: None,
            elapsed_ms: 12,
        }
    }

    #[test]
    fn sanitize_simple() {
        assert_eq!(sanitize_filename("GET /api/unknown"), "GET__api_unknown.jsonl");
    }

    #[test]
    fn sanitize_path_with_id() {
        assert_eq!(
            sanitize_filename("PATCH /api/users/{id}"),
            "PATCH__api_users__id_.jsonl"
        );
    }

    #[test]
    fn mask_request_and_response_headers() {
        let e = exchange(Method::Post, "https://reqres.in/api/register", 200);
        let masked = mask_exchange(&e);
        assert_eq!(masked.request.headers["x-api-key"], "***");
        assert_eq!(masked.request.headers["Content-Type"], "application/json");
        let response = masked.response.unwrap();
        assert_eq!(response.header("set-cookie"), Some("***"));
        assert_eq!(response.body(), r#"{"token":"QpwL5tke4Pnpja7X4"}"#);
    }

    #[test]
    fn no_mask_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let exchanges = vec![exchange(Method::Post, "https://reqres.in/api/register", 200)];
        let index = write_dump(&exchanges, dir.path(), false).unwrap();
        assert_eq!(index.total, 1);

        let file_path = dir.path().join(&index.operations[0].file);
        let content = std::fs::read_to_string(file_path).unwrap();
        let parsed: Exchange = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed.request.headers["x-api-key"], "reqres-free-v1");
    }

    #[test]
    fn write_dump_groups_by_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let exchanges = vec![
            exchange(Method::Post, "https://reqres.in/api/register", 200),
            exchange(Method::Post, "https://reqres.in/api/register", 400),
            exchange(Method::Get, "https://reqres.in/api/unknown", 200),
        ];

        let index = write_dump(&exchanges, dir.path(), true).unwrap();

        assert_eq!(index.total, 3);
        assert_eq!(index.operations.len(), 2);
        assert_eq!(index.operations[0].operation, "GET /api/unknown");
        assert_eq!(index.operations[0].count, 1);
        assert_eq!(index.operations[1].operation, "POST /api/register");
        assert_eq!(index.operations[1].count, 2);

        for entry in &index.operations {
            let content = std::fs::read_to_string(dir.path().join(&entry.file)).unwrap();
            let lines: Vec<_> = content.lines().collect();
            assert_eq!(lines.len(), entry.count as usize, "{}", entry.file);
            for line in lines {
                let parsed: Exchange = serde_json::from_str(line).unwrap();
                assert_eq!(parsed.request.headers["x-api-key"], "***");
            }
        }

        let index_content = std::fs::read_to_string(dir.path().join("index.json")).unwrap();
        let parsed: DumpIndex = serde_json::from_str(&index_content).unwrap();
        assert_eq!(parsed.total, 3);
    }

    #[test]
    fn transport_failures_are_dumped_without_response() {
        let dir = tempfile::tempdir().unwrap();
        let mut e = exchange(Method::Get, "https://reqres.in/api/unknown", 0);
        e.response = None;
        e.error = Some("connection refused".into());
        write_dump(&[e], dir.path(), true).unwrap();

        let content =
            std::fs::read_to_string(dir.path().join("GET__api_unknown.jsonl")).unwrap();
        let parsed: Exchange = serde_json::from_str(content.trim()).unwrap();
        assert!(parsed.response.is_none());
        assert_eq!(parsed.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn write_dump_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_dump(&[], dir.path(), true).unwrap();
        assert_eq!(index.total, 0);
        assert!(index.operations.is_empty());
        assert!(dir.path().join("index.json").exists());
    }
}
