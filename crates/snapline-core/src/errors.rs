use snapline_core_types::{RequestId, TraceId};
use thiserror::Error;

use crate::model::{SnapshotStatus, Transition};

/// Result type alias using SnapshotError
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Result type alias used at port boundaries (repository, engine, store)
pub type ExResult<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code and to one of the
/// [`ErrorCategory`] buckets that decide whether a caller may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Structural validation
    InvalidInput,
    DepthExceeded,
    InvalidParentKind,
    IllegalMove,
    SelfLoop,
    CycleDetected,
    DuplicatePredecessor,
    InvalidStartItem,
    UnreachableItems,
    ItemHasDependents,
    ConstraintViolation,

    // State machine
    IllegalStateTransition,
    ImmutableSnapshot,
    PolicyDenied,

    // Concurrency
    ConcurrentModification,
    AnotherSnapshotActive,
    LockTimeout,

    // Lookup
    NotFound,

    // Infrastructure
    Io,
    Serialization,
    Persistence,
    Internal,
}

/// Coarse error classes used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller-correctable, never retried
    Structural,
    /// Caller logic error, never retried
    StateMachine,
    /// Transient; retry after reloading the aggregate
    Concurrency,
    /// Terminal for the request
    NotFound,
    /// Storage or runtime failure outside the domain
    Infrastructure,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::DepthExceeded => "ERR_DEPTH_EXCEEDED",
            ExErrorKind::InvalidParentKind => "ERR_INVALID_PARENT_KIND",
            ExErrorKind::IllegalMove => "ERR_ILLEGAL_MOVE",
            ExErrorKind::SelfLoop => "ERR_SELF_LOOP",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::DuplicatePredecessor => "ERR_DUPLICATE_PREDECESSOR",
            ExErrorKind::InvalidStartItem => "ERR_INVALID_START_ITEM",
            ExErrorKind::UnreachableItems => "ERR_UNREACHABLE_ITEMS",
            ExErrorKind::ItemHasDependents => "ERR_ITEM_HAS_DEPENDENTS",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::IllegalStateTransition => "ERR_ILLEGAL_STATE_TRANSITION",
            ExErrorKind::ImmutableSnapshot => "ERR_IMMUTABLE_SNAPSHOT",
            ExErrorKind::PolicyDenied => "ERR_POLICY_DENIED",
            ExErrorKind::ConcurrentModification => "ERR_CONCURRENT_MODIFICATION",
            ExErrorKind::AnotherSnapshotActive => "ERR_ANOTHER_SNAPSHOT_ACTIVE",
            ExErrorKind::LockTimeout => "ERR_LOCK_TIMEOUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ExErrorKind::InvalidInput
            | ExErrorKind::DepthExceeded
            | ExErrorKind::InvalidParentKind
            | ExErrorKind::IllegalMove
            | ExErrorKind::SelfLoop
            | ExErrorKind::CycleDetected
            | ExErrorKind::DuplicatePredecessor
            | ExErrorKind::InvalidStartItem
            | ExErrorKind::UnreachableItems
            | ExErrorKind::ItemHasDependents
            | ExErrorKind::ConstraintViolation => ErrorCategory::Structural,
            ExErrorKind::IllegalStateTransition
            | ExErrorKind::ImmutableSnapshot
            | ExErrorKind::PolicyDenied => ErrorCategory::StateMachine,
            ExErrorKind::ConcurrentModification
            | ExErrorKind::AnotherSnapshotActive
            | ExErrorKind::LockTimeout => ErrorCategory::Concurrency,
            ExErrorKind::NotFound => ErrorCategory::NotFound,
            ExErrorKind::Io
            | ExErrorKind::Serialization
            | ExErrorKind::Persistence
            | ExErrorKind::Internal => ErrorCategory::Infrastructure,
        }
    }

    /// Whether a caller may retry the operation after reloading
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Concurrency
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// context needed to debug a failed request.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    snapshot_id: Option<String>,
    program_id: Option<String>,
    item_id: Option<String>,
    item_ids: Option<Vec<String>>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            snapshot_id: None,
            program_id: None,
            item_id: None,
            item_ids: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_snapshot_id(mut self, id: impl Into<String>) -> Self {
        self.snapshot_id = Some(id.into());
        self
    }

    pub fn with_program_id(mut self, id: impl Into<String>) -> Self {
        self.program_id = Some(id.into());
        self
    }

    pub fn with_item_id(mut self, id: impl Into<String>) -> Self {
        self.item_id = Some(id.into());
        self
    }

    /// Attach a set of affected items (unreachable leaves, stranded dependents)
    pub fn with_item_ids(mut self, ids: Vec<String>) -> Self {
        self.item_ids = Some(ids);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn snapshot_id(&self) -> Option<&str> {
        self.snapshot_id.as_deref()
    }

    pub fn program_id(&self) -> Option<&str> {
        self.program_id.as_deref()
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn item_ids(&self) -> Option<&[String]> {
        self.item_ids.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(snapshot_id) = &self.snapshot_id {
            write!(f, " (snapshot_id: {})", snapshot_id)?;
        }
        if let Some(item_id) = &self.item_id {
            write!(f, " (item_id: {})", item_id)?;
        }
        if let Some(item_ids) = &self.item_ids {
            write!(f, " (items: {})", item_ids.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for snapshot operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    // ===== Lookup =====
    #[error("Snapshot not found: {snapshot_id}")]
    SnapshotNotFound { snapshot_id: String },

    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    // ===== Hierarchy =====
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Container item {item_id} cannot carry a learning object")]
    LearningObjectOnContainer { item_id: String },

    #[error("Depth {depth} exceeds maximum {max_depth} under parent {parent_id}")]
    DepthExceeded {
        parent_id: String,
        depth: u8,
        max_depth: u8,
    },

    #[error("Parent {parent_id} is a leaf and cannot own children")]
    InvalidParentKind { parent_id: String },

    #[error("Cannot move item {item_id}: {reason}")]
    IllegalMove { item_id: String, reason: String },

    // ===== Relations =====
    #[error("Relation endpoint {item_id} is not a leaf item")]
    RelationEndpointNotLeaf { item_id: String },

    #[error("Relation from {item_id} to itself is not allowed")]
    SelfLoop { item_id: String },

    #[error("Relation {from_item_id} -> {to_item_id} would create a cycle")]
    CycleDetected {
        from_item_id: String,
        to_item_id: String,
    },

    #[error("Item {item_id} already follows {existing_predecessor_id}; cannot also follow {rejected_predecessor_id}")]
    DuplicatePredecessor {
        item_id: String,
        existing_predecessor_id: String,
        rejected_predecessor_id: String,
    },

    #[error("Relation {from_item_id} -> {to_item_id} references an item outside the snapshot")]
    DanglingRelation {
        from_item_id: String,
        to_item_id: String,
    },

    // ===== Start item / reachability =====
    #[error("Invalid start item {item_id}: {reason}")]
    InvalidStartItem { item_id: String, reason: String },

    #[error("Snapshot {snapshot_id} has no start item")]
    StartItemMissing { snapshot_id: String },

    #[error("Items unreachable from start item {start_item_id}: {item_ids:?}")]
    UnreachableItems {
        start_item_id: String,
        item_ids: Vec<String>,
    },

    #[error("Removing item {item_id} would disconnect {dependents:?} from the start item")]
    ItemHasDependents {
        item_id: String,
        dependents: Vec<String>,
    },

    // ===== Lifecycle =====
    #[error("Cannot {transition} snapshot {snapshot_id} in status {status}")]
    IllegalStateTransition {
        snapshot_id: String,
        status: SnapshotStatus,
        transition: Transition,
    },

    #[error("Snapshot {snapshot_id} is {status} and structurally frozen")]
    ImmutableSnapshot {
        snapshot_id: String,
        status: SnapshotStatus,
    },

    #[error("Program {program_id} already has active snapshot {active_snapshot_id}")]
    AnotherSnapshotActive {
        program_id: String,
        active_snapshot_id: String,
    },

    // ===== Concurrency =====
    #[error("Snapshot {snapshot_id} was modified concurrently (expected version {expected_version}, found {actual_version})")]
    ConcurrentModification {
        snapshot_id: String,
        expected_version: u64,
        actual_version: u64,
    },

    #[error("Timed out after {waited_ms}ms waiting for lock on {resource}")]
    LockTimeout { resource: String, waited_ms: u64 },

    // ===== Generic =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        let message = err.to_string();
        let ex = match err {
            SnapshotError::SnapshotNotFound { snapshot_id } => {
                ExError::new(ExErrorKind::NotFound).with_snapshot_id(snapshot_id)
            }
            SnapshotError::ItemNotFound { item_id } => {
                ExError::new(ExErrorKind::NotFound).with_item_id(item_id)
            }
            SnapshotError::InvalidName { .. } => ExError::new(ExErrorKind::InvalidInput),
            SnapshotError::LearningObjectOnContainer { item_id } => {
                ExError::new(ExErrorKind::InvalidInput).with_item_id(item_id)
            }
            SnapshotError::DepthExceeded { parent_id, .. } => {
                ExError::new(ExErrorKind::DepthExceeded).with_item_id(parent_id)
            }
            SnapshotError::InvalidParentKind { parent_id } => {
                ExError::new(ExErrorKind::InvalidParentKind).with_item_id(parent_id)
            }
            SnapshotError::IllegalMove { item_id, .. } => {
                ExError::new(ExErrorKind::IllegalMove).with_item_id(item_id)
            }
            SnapshotError::RelationEndpointNotLeaf { item_id } => {
                ExError::new(ExErrorKind::InvalidInput).with_item_id(item_id)
            }
            SnapshotError::SelfLoop { item_id } => {
                ExError::new(ExErrorKind::SelfLoop).with_item_id(item_id)
            }
            SnapshotError::CycleDetected {
                from_item_id,
                to_item_id,
            } => ExError::new(ExErrorKind::CycleDetected)
                .with_item_ids(vec![from_item_id, to_item_id]),
            SnapshotError::DuplicatePredecessor { item_id, .. } => {
                ExError::new(ExErrorKind::DuplicatePredecessor).with_item_id(item_id)
            }
            SnapshotError::DanglingRelation {
                from_item_id,
                to_item_id,
            } => ExError::new(ExErrorKind::ConstraintViolation)
                .with_item_ids(vec![from_item_id, to_item_id]),
            SnapshotError::InvalidStartItem { item_id, .. } => {
                ExError::new(ExErrorKind::InvalidStartItem).with_item_id(item_id)
            }
            SnapshotError::StartItemMissing { snapshot_id } => {
                ExError::new(ExErrorKind::InvalidStartItem).with_snapshot_id(snapshot_id)
            }
            SnapshotError::UnreachableItems {
                start_item_id,
                item_ids,
            } => ExError::new(ExErrorKind::UnreachableItems)
                .with_item_id(start_item_id)
                .with_item_ids(item_ids),
            SnapshotError::ItemHasDependents {
                item_id,
                dependents,
            } => ExError::new(ExErrorKind::ItemHasDependents)
                .with_item_id(item_id)
                .with_item_ids(dependents),
            SnapshotError::IllegalStateTransition { snapshot_id, .. } => {
                ExError::new(ExErrorKind::IllegalStateTransition).with_snapshot_id(snapshot_id)
            }
            SnapshotError::ImmutableSnapshot { snapshot_id, .. } => {
                ExError::new(ExErrorKind::ImmutableSnapshot).with_snapshot_id(snapshot_id)
            }
            SnapshotError::AnotherSnapshotActive {
                program_id,
                active_snapshot_id,
            } => ExError::new(ExErrorKind::AnotherSnapshotActive)
                .with_program_id(program_id)
                .with_snapshot_id(active_snapshot_id),
            SnapshotError::ConcurrentModification { snapshot_id, .. } => {
                ExError::new(ExErrorKind::ConcurrentModification).with_snapshot_id(snapshot_id)
            }
            SnapshotError::LockTimeout { .. } => ExError::new(ExErrorKind::LockTimeout),
            SnapshotError::Serialization { .. } => ExError::new(ExErrorKind::Serialization),
            SnapshotError::Internal { .. } => ExError::new(ExErrorKind::Internal),
        };
        ex.with_message(message)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization {
            message: err.to_string(),
        }
    }
}
