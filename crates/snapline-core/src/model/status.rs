use serde::{Deserialize, Serialize};

/// Publication state of a snapshot
///
/// `Draft` is the only structurally mutable state. `Archived` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Draft,
    Active,
    Completed,
    Archived,
}

/// A lifecycle transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Activate,
    Complete,
    Archive,
}

/// The complete transition table. Anything not listed here is illegal.
const TRANSITIONS: &[(SnapshotStatus, Transition, SnapshotStatus)] = &[
    (SnapshotStatus::Draft, Transition::Activate, SnapshotStatus::Active),
    (SnapshotStatus::Active, Transition::Complete, SnapshotStatus::Completed),
    (SnapshotStatus::Draft, Transition::Archive, SnapshotStatus::Archived),
    (SnapshotStatus::Active, Transition::Archive, SnapshotStatus::Archived),
    (SnapshotStatus::Completed, Transition::Archive, SnapshotStatus::Archived),
];

impl SnapshotStatus {
    /// Resolve the target state of `transition` from this state
    pub fn next(self, transition: Transition) -> Option<SnapshotStatus> {
        TRANSITIONS
            .iter()
            .find(|(from, t, _)| *from == self && *t == transition)
            .map(|(_, _, to)| *to)
    }

    /// Whether items and relations may be changed in this state
    pub fn is_structurally_mutable(self) -> bool {
        self == SnapshotStatus::Draft
    }

    pub fn is_terminal(self) -> bool {
        TRANSITIONS.iter().all(|(from, _, _)| *from != self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotStatus::Draft => "draft",
            SnapshotStatus::Active => "active",
            SnapshotStatus::Completed => "completed",
            SnapshotStatus::Archived => "archived",
        }
    }

    /// Parse the persisted representation produced by [`SnapshotStatus::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(SnapshotStatus::Draft),
            "active" => Some(SnapshotStatus::Active),
            "completed" => Some(SnapshotStatus::Completed),
            "archived" => Some(SnapshotStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Activate => "activate",
            Transition::Complete => "complete",
            Transition::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
