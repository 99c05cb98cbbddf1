//! Raw job records as fetched from the dashboard backend.
//!
//! Upstream payloads are loosely shaped: `dependencies` is either a list of
//! parent-id strings or a list of structured `{source, target, type}` edge
//! objects, the kind field drifts between `type` and `componentType`, and
//! timestamps arrive as RFC 3339 strings. Everything is normalized here,
//! once, so the graph model only ever sees the canonical representation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::edge::DependencyKind;
use super::node::{JobKind, JobNode, JobStatus};

/// Error for an undeserializable payload at the wasm boundary.
///
/// Note this covers only the payload as a whole; individually malformed
/// records and edges are dropped with a warning during normalization and
/// never fail the build.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload could not be deserialized into job records at all.
    #[error("failed to deserialize job records: {0}")]
    Deserialize(String),
}

/// A job record as fetched from the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique job id.
    pub id: String,
    /// Display name; defaults to the id when missing.
    #[serde(default)]
    pub name: Option<String>,
    /// Raw status string, either vocabulary.
    #[serde(default)]
    pub status: Option<String>,
    /// Raw kind string. Some payload variants call this `componentType`.
    #[serde(default, rename = "type", alias = "componentType")]
    pub kind: Option<String>,
    /// RFC 3339 run start.
    #[serde(default)]
    pub start_time: Option<String>,
    /// RFC 3339 run end.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Dependencies in either upstream form.
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
}

/// A dependency in either upstream form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDependency {
    /// Bare parent-id string: "this job depends on `parent`".
    ParentId(String),
    /// Structured edge object. Fields are optional so a malformed object
    /// still deserializes and can be dropped with a diagnostic instead of
    /// failing the payload.
    Edge {
        /// Source job id (the parent/dependency side).
        #[serde(default)]
        source: Option<String>,
        /// Target job id (the dependent side).
        #[serde(default)]
        target: Option<String>,
        /// Edge kind string (`parent`, `cross`, `condition`).
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

/// A dependency normalized to the structured form, endpoints still as
/// string ids (resolved to slots by the model build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDependency {
    /// Source job id.
    pub source: String,
    /// Target job id.
    pub target: String,
    /// Edge kind.
    pub kind: DependencyKind,
}

impl JobRecord {
    /// Minimal record constructor used by tests and dataset generators.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            status: None,
            kind: None,
            start_time: None,
            end_time: None,
            dependencies: Vec::new(),
        }
    }

    /// Add a parent dependency in the structured form.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        let parent = parent_id.into();
        self.dependencies.push(RawDependency::Edge {
            source: Some(parent),
            target: Some(self.id.clone()),
            kind: Some("parent".to_owned()),
        });
        self
    }

    /// Add a cross dependency in the structured form.
    pub fn with_cross(mut self, target_id: impl Into<String>) -> Self {
        self.dependencies.push(RawDependency::Edge {
            source: Some(self.id.clone()),
            target: Some(target_id.into()),
            kind: Some("cross".to_owned()),
        });
        self
    }

    /// Convert to the canonical node representation.
    pub fn to_node(&self) -> JobNode {
        JobNode {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            status: self
                .status
                .as_deref()
                .map(JobStatus::parse)
                .unwrap_or(JobStatus::Waiting),
            kind: self
                .kind
                .as_deref()
                .map(JobKind::parse)
                .unwrap_or(JobKind::Other),
            start_time: parse_timestamp(self.start_time.as_deref(), &self.id, "startTime"),
            end_time: parse_timestamp(self.end_time.as_deref(), &self.id, "endTime"),
        }
    }

    /// Normalize this record's dependencies to structured edges.
    ///
    /// Bare parent-id strings become `parent → self` edges of kind
    /// `Parent`. Structured edges missing an endpoint are dropped with a
    /// warning. Returns the edges together with the number dropped.
    pub fn normalized_dependencies(&self) -> (Vec<NormalizedDependency>, usize) {
        let mut edges = Vec::with_capacity(self.dependencies.len());
        let mut dropped = 0;

        for dep in &self.dependencies {
            match dep {
                RawDependency::ParentId(parent) => edges.push(NormalizedDependency {
                    source: parent.clone(),
                    target: self.id.clone(),
                    kind: DependencyKind::Parent,
                }),
                RawDependency::Edge {
                    source,
                    target,
                    kind,
                } => match (source, target) {
                    (Some(source), Some(target)) => edges.push(NormalizedDependency {
                        source: source.clone(),
                        target: target.clone(),
                        kind: kind
                            .as_deref()
                            .map(DependencyKind::parse)
                            .unwrap_or(DependencyKind::Parent),
                    }),
                    _ => {
                        log::warn!(
                            "dropping malformed dependency on job {:?}: missing source or target",
                            self.id
                        );
                        dropped += 1;
                    }
                },
            }
        }

        (edges, dropped)
    }
}

/// Parse an RFC 3339 timestamp, dropping unparseable values with a warning.
fn parse_timestamp(raw: Option<&str>, job_id: &str, field: &str) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(err) => {
            log::warn!("job {job_id:?}: ignoring unparseable {field} {raw:?}: {err}");
            None
        }
    }
}
