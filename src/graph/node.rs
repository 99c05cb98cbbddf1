//! Node types for the job dependency graph.
//!
//! Each job node has:
//! - A stable unique identifier (survives graph queries and layout passes)
//! - The job's display name, status and component kind
//! - Optional run timing (absent for jobs that have not run yet)
//! - State flags (pinned, selected, hovered, virtual)

use std::fmt;

use chrono::{DateTime, Utc};

/// Stable node identifier.
///
/// Wraps the node's slot index as a u32 for efficient storage and
/// WebAssembly interop. String job ids are interned to `NodeId`s by
/// [`GraphModel::build`](super::GraphModel::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the slot index into the model's SoA arrays.
    #[inline]
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Unified job status.
///
/// Upstream payloads use two vocabularies for the same lifecycle: live job
/// records say `running/completed/failed/waiting` while run-history entries
/// say `success/failed/aborted` (plus `pending`). Both map onto this one
/// enum; see [`JobStatus::parse`] for the translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Queued or blocked on dependencies (`waiting`, `pending`).
    Waiting,
    /// Currently executing.
    Running,
    /// Finished successfully (`completed`, `success`).
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Aborted,
}

impl JobStatus {
    /// Parse a status string from either upstream vocabulary.
    ///
    /// | input                  | status      |
    /// |------------------------|-------------|
    /// | `waiting`, `pending`   | `Waiting`   |
    /// | `running`              | `Running`   |
    /// | `completed`, `success` | `Completed` |
    /// | `failed`               | `Failed`    |
    /// | `aborted`              | `Aborted`   |
    ///
    /// Unknown strings fall back to `Waiting` with a logged warning so a
    /// single odd record cannot take down the whole graph.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "waiting" | "pending" => Self::Waiting,
            "running" => Self::Running,
            "completed" | "success" => Self::Completed,
            "failed" => Self::Failed,
            "aborted" => Self::Aborted,
            other => {
                log::warn!("unknown job status {other:?}, treating as waiting");
                Self::Waiting
            }
        }
    }

    /// True for statuses a finished run can carry.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job component kind, used for color/shape encoding.
///
/// Upstream data mixes scheduler vocabulary (`BOX`, `CMD`/`command`) with
/// pipeline vocabulary (`process`, `input`, `output`); both are normalized
/// here at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Container grouping other jobs.
    Box,
    /// Executable command job.
    Command,
    /// Pipeline processing step.
    Process,
    /// Pipeline input.
    Input,
    /// Pipeline output.
    Output,
    /// Anything not in either vocabulary.
    Other,
}

impl JobKind {
    /// Parse a kind string, case-insensitively, from either vocabulary.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "box" => Self::Box,
            "cmd" | "command" => Self::Command,
            "process" => Self::Process,
            "input" => Self::Input,
            "output" => Self::Output,
            _ => Self::Other,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Command => "command",
            Self::Process => "process",
            Self::Input => "input",
            Self::Output => "output",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job node as held by the graph model.
#[derive(Debug, Clone)]
pub struct JobNode {
    /// Unique job id from the upstream payload. The id `"root"` is reserved
    /// for the synthetic virtual root.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Unified status.
    pub status: JobStatus,
    /// Component kind.
    pub kind: JobKind,
    /// Run start, if the job has started.
    pub start_time: Option<DateTime<Utc>>,
    /// Run end, if the job has finished.
    pub end_time: Option<DateTime<Utc>>,
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const PINNED: u8 = 0b0000_0001;
    const SELECTED: u8 = 0b0000_0010;
    const HOVERED: u8 = 0b0000_0100;
    const VIRTUAL: u8 = 0b0000_1000;

    /// Create a new default node state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the node is pinned (held at a fixed position).
    #[inline]
    pub fn is_pinned(self) -> bool {
        self.flags & Self::PINNED != 0
    }

    /// Set the pinned state.
    #[inline]
    pub fn set_pinned(&mut self, pinned: bool) {
        if pinned {
            self.flags |= Self::PINNED;
        } else {
            self.flags &= !Self::PINNED;
        }
    }

    /// Check if the node is selected.
    #[inline]
    pub fn is_selected(self) -> bool {
        self.flags & Self::SELECTED != 0
    }

    /// Set the selected state.
    #[inline]
    pub fn set_selected(&mut self, selected: bool) {
        if selected {
            self.flags |= Self::SELECTED;
        } else {
            self.flags &= !Self::SELECTED;
        }
    }

    /// Check if the node is hovered.
    #[inline]
    pub fn is_hovered(self) -> bool {
        self.flags & Self::HOVERED != 0
    }

    /// Set the hovered state.
    #[inline]
    pub fn set_hovered(&mut self, hovered: bool) {
        if hovered {
            self.flags |= Self::HOVERED;
        } else {
            self.flags &= !Self::HOVERED;
        }
    }

    /// Check if the node is the synthetic virtual root.
    ///
    /// Virtual nodes exist for layout only: they are never selectable and
    /// never emit navigation events.
    #[inline]
    pub fn is_virtual(self) -> bool {
        self.flags & Self::VIRTUAL != 0
    }

    /// Mark the node as the synthetic virtual root.
    #[inline]
    pub fn set_virtual(&mut self, virt: bool) {
        if virt {
            self.flags |= Self::VIRTUAL;
        } else {
            self.flags &= !Self::VIRTUAL;
        }
    }
}
