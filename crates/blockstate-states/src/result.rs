//! The outcome record every state function returns.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Tri-state outcome of a state function.
///
/// Serialises as `true`, `false` and `null` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The resource is in the desired condition, possibly after a change.
    Success,
    /// The resource could not be brought into the desired condition.
    Failed,
    /// Test mode: a change would be made but was not applied.
    Pending,
}

impl Outcome {
    pub fn as_option(self) -> Option<bool> {
        match self {
            Outcome::Success => Some(true),
            Outcome::Failed => Some(false),
            Outcome::Pending => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Pending => write!(f, "pending"),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// Before/after values of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub old: String,
    pub new: String,
}

impl Change {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Result record of one state function invocation.
///
/// Built fresh per call, starting from [`StateResult::new`], and handed back to
/// the caller by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateResult {
    name: String,
    #[serde(rename = "result")]
    outcome: Outcome,
    changes: BTreeMap<String, Change>,
    comment: String,
}

impl StateResult {
    /// Zero value: success, no changes, no comment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Outcome::Success,
            changes: BTreeMap::new(),
            comment: String::new(),
        }
    }

    pub fn succeeded(mut self, comment: impl AsRef<str>) -> Self {
        self.outcome = Outcome::Success;
        self.push_comment(comment);
        self
    }

    pub fn failed(mut self, comment: impl AsRef<str>) -> Self {
        self.outcome = Outcome::Failed;
        self.push_comment(comment);
        self
    }

    pub fn pending(mut self, comment: impl AsRef<str>) -> Self {
        self.outcome = Outcome::Pending;
        self.push_comment(comment);
        self
    }

    pub fn with_change(
        mut self,
        attribute: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        self.changes.insert(attribute.into(), Change::new(old, new));
        self
    }

    /// Append to the comment. Templates carry their own trailing separators.
    pub fn push_comment(&mut self, comment: impl AsRef<str>) {
        self.comment.push_str(comment.as_ref());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn changes(&self) -> &BTreeMap<String, Change> {
        &self.changes
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

impl fmt::Display for StateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.name, self.outcome, self.comment.trim_end())?;
        for (attribute, change) in &self.changes {
            write!(f, "\n    {}: {} -> {}", attribute, change.old, change.new)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_value_is_unchanged_success() {
        let ret = StateResult::new("/dev/sda");
        assert_eq!(ret.outcome(), Outcome::Success);
        assert!(ret.changes().is_empty());
        assert_eq!(ret.comment(), "");
    }

    #[test]
    fn serialises_to_name_result_changes_comment() {
        let ret = StateResult::new("/dev/sda1")
            .succeeded("/dev/sda1 has been formatted with xfs")
            .with_change("fs_type", "ext4", "xfs");

        assert_eq!(
            serde_json::to_value(&ret).unwrap(),
            json!({
                "name": "/dev/sda1",
                "result": true,
                "changes": {"fs_type": {"old": "ext4", "new": "xfs"}},
                "comment": "/dev/sda1 has been formatted with xfs",
            })
        );
    }

    #[test]
    fn pending_serialises_as_null() {
        let ret = StateResult::new("/dev/sda").pending("Changes to /dev/sda will be applied ");
        let value = serde_json::to_value(&ret).unwrap();
        assert!(value["result"].is_null());
    }

    #[test]
    fn comments_accumulate() {
        let mut ret = StateResult::new("/dev/sda").failed("first. ");
        ret.push_comment("second.");
        assert_eq!(ret.comment(), "first. second.");
    }

    #[test]
    fn display_lists_changes() {
        let ret = StateResult::new("/dev/sdb")
            .succeeded("Block device /dev/sdb successfully modified ")
            .with_change("read-ahead", "256", "512");
        assert_eq!(
            ret.to_string(),
            "/dev/sdb [success] Block device /dev/sdb successfully modified\n    read-ahead: 256 -> 512"
        );
    }
}
