//! Minimal JSON path: dotted keys with array indices (`data[0].id`)

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Path into a JSON document. The empty path (or `$`) is the whole document.
///
/// Parsing never fails: a bracket that does not hold an index is kept as part
/// of the key, so `a[x]` looks up the literal key `a[x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("$.")
            .or_else(|| trimmed.strip_prefix('$'))
            .unwrap_or(trimmed);

        let mut segments = Vec::new();
        for part in body.split('.').filter(|p| !p.is_empty()) {
            parse_part(part, &mut segments);
        }

        Self {
            raw: trimmed.to_string(),
            segments,
        }
    }

    /// The whole document.
    #[must_use]
    pub fn root() -> Self {
        Self::parse("")
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Follow the path; `None` when any segment is missing.
    #[must_use]
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(idx) => current.get(*idx),
            })
    }
}

fn parse_part(part: &str, segments: &mut Vec<Segment>) {
    let Some(open) = part.find('[') else {
        segments.push(Segment::Key(part.to_string()));
        return;
    };

    let mut indices = Vec::new();
    let mut rest = &part[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        let Ok(idx) = inner[..close].trim().parse::<usize>() else {
            break;
        };
        indices.push(Segment::Index(idx));
        rest = &inner[close + 1..];
    }

    if !rest.is_empty() {
        // Not a clean `key[n][m]` form: treat the whole part as a key.
        segments.push(Segment::Key(part.to_string()));
        return;
    }

    if open > 0 {
        segments.push(Segment::Key(part[..open].to_string()));
    }
    segments.extend(indices);
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("$")
        } else {
            f.write_str(&self.raw)
        }
    }
}

impl From<&str> for JsonPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
