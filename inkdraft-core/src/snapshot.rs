//! Serialized editor documents.
//!
//! The editing surface hands us its whole document as a JSON string after
//! every change. The auto-save pipeline treats that string as opaque and
//! compares snapshots byte for byte; the helpers here only look inside when
//! loading persisted content or when text has to be extracted for an AI
//! rewrite.

use serde_json::{json, Value};
use std::fmt;

/// Full document content at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// A document with a single empty paragraph.
    pub fn empty() -> Self {
        Self::from_plain_text("")
    }

    /// Restores the snapshot stored on a post.
    ///
    /// Content that does not parse as JSON falls back to `None`, which the
    /// editor treats as an empty document.
    pub fn from_persisted(content: Option<&str>) -> Option<Self> {
        let content = content?;
        match serde_json::from_str::<Value>(content) {
            Ok(_) => Some(Self(content.to_string())),
            Err(e) => {
                tracing::warn!("Ignoring malformed persisted content: {}", e);
                None
            }
        }
    }

    /// Builds a document holding `text` as one paragraph.
    pub fn from_plain_text(text: &str) -> Self {
        let children = if text.is_empty() {
            json!([])
        } else {
            json!([{
                "detail": 0,
                "format": 0,
                "mode": "normal",
                "style": "",
                "text": text,
                "type": "text",
                "version": 1
            }])
        };
        let doc = json!({
            "root": {
                "children": [{
                    "children": children,
                    "direction": null,
                    "format": "",
                    "indent": 0,
                    "type": "paragraph",
                    "version": 1
                }],
                "direction": null,
                "format": "",
                "indent": 0,
                "type": "root",
                "version": 1
            }
        });
        Self(doc.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Snapshot {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Snapshot {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the readable text of a document, one line per top-level block.
///
/// Snapshots that are not editor JSON are returned unchanged so plain text
/// can be fed through the same path.
pub fn plain_text(snapshot: &Snapshot) -> String {
    let Ok(doc) = serde_json::from_str::<Value>(snapshot.as_str()) else {
        return snapshot.as_str().to_string();
    };

    let Some(blocks) = doc
        .get("root")
        .and_then(|root| root.get("children"))
        .and_then(Value::as_array)
    else {
        return String::new();
    };

    blocks
        .iter()
        .map(|block| {
            let mut line = String::new();
            collect_text(block, &mut line);
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if node.get("type").and_then(Value::as_str) == Some("linebreak") {
        out.push('\n');
    }
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}
