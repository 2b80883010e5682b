//! Diff result values and their text rendering

use std::fmt::{self, Write as _};

use serde::Serialize;

/// Kind of a single difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffType {
    Added,
    Removed,
    /// Resolved type name changed
    Modified,
    DocChanged,
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::Modified => "MODIFIED",
            Self::DocChanged => "DOC_CHANGED",
        };
        f.write_str(label)
    }
}

/// One difference at a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffItem {
    pub path: String,
    #[serde(rename = "type")]
    pub diff_type: DiffType,
    pub description: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl DiffItem {
    pub fn added(path: &str, name: &str, documentation: Option<String>) -> Self {
        Self {
            path: path.to_string(),
            diff_type: DiffType::Added,
            description: format!("Element '{}' added", name),
            old_value: None,
            new_value: documentation,
        }
    }

    pub fn removed(path: &str, name: &str, documentation: Option<String>) -> Self {
        Self {
            path: path.to_string(),
            diff_type: DiffType::Removed,
            description: format!("Element '{}' removed", name),
            old_value: documentation,
            new_value: None,
        }
    }

    pub fn type_changed(path: &str, old: Option<String>, new: Option<String>) -> Self {
        Self {
            path: path.to_string(),
            diff_type: DiffType::Modified,
            description: format!(
                "Type changed from '{}' to '{}'",
                old.as_deref().unwrap_or("(none)"),
                new.as_deref().unwrap_or("(none)")
            ),
            old_value: old,
            new_value: new,
        }
    }

    pub fn doc_changed(path: &str, old: Option<String>, new: Option<String>) -> Self {
        Self {
            path: path.to_string(),
            diff_type: DiffType::DocChanged,
            description: "Documentation changed".to_string(),
            old_value: old,
            new_value: new,
        }
    }
}

/// Status of a message across two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::Changed => "CHANGED",
            Self::Unchanged => "UNCHANGED",
        };
        f.write_str(label)
    }
}

/// All differences of one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDiff {
    pub message_name: String,
    pub differences: Vec<DiffItem>,
    pub status: MessageStatus,
}

impl MessageDiff {
    pub fn new(message_name: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            message_name: message_name.into(),
            differences: Vec::new(),
            status,
        }
    }
}

/// Counts over a set of message diffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub messages_added: usize,
    pub messages_removed: usize,
    pub messages_changed: usize,
    pub messages_unchanged: usize,
    pub items_added: usize,
    pub items_removed: usize,
    pub items_modified: usize,
    pub items_doc_changed: usize,
}

impl DiffSummary {
    pub fn from_diffs(diffs: &[MessageDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.status {
                MessageStatus::Added => summary.messages_added += 1,
                MessageStatus::Removed => summary.messages_removed += 1,
                MessageStatus::Changed => summary.messages_changed += 1,
                MessageStatus::Unchanged => summary.messages_unchanged += 1,
            }
            for item in &diff.differences {
                match item.diff_type {
                    DiffType::Added => summary.items_added += 1,
                    DiffType::Removed => summary.items_removed += 1,
                    DiffType::Modified => summary.items_modified += 1,
                    DiffType::DocChanged => summary.items_doc_changed += 1,
                }
            }
        }
        summary
    }

    pub fn total_items(&self) -> usize {
        self.items_added + self.items_removed + self.items_modified + self.items_doc_changed
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "messages: {} changed, {} added, {} removed; items: {} added, {} removed, {} modified, {} doc changed",
            self.messages_changed,
            self.messages_added,
            self.messages_removed,
            self.items_added,
            self.items_removed,
            self.items_modified,
            self.items_doc_changed
        )
    }
}

/// Human-readable report, one block per message followed by a summary line
pub fn render_text(from: &str, to: &str, diffs: &[MessageDiff]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schema diff {} → {}", from, to);

    for diff in diffs {
        let _ = writeln!(
            out,
            "\n{} [{}] ({} differences)",
            diff.message_name,
            diff.status,
            diff.differences.len()
        );
        for item in &diff.differences {
            let _ = write!(out, "  {:<12} {}  {}", item.diff_type.to_string(), item.path, item.description);
            match (&item.old_value, &item.new_value) {
                (Some(old), Some(new)) => {
                    let _ = write!(out, " ({:?} → {:?})", old, new);
                }
                (Some(old), None) => {
                    let _ = write!(out, " (was {:?})", old);
                }
                (None, Some(new)) => {
                    let _ = write!(out, " (now {:?})", new);
                }
                (None, None) => {}
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "\n{}", DiffSummary::from_diffs(diffs));
    out
}
