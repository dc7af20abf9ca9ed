//! Read-only reference checks against the artifact/museum directory.
//!
//! The directory itself (CRUD, ownership records) lives outside the engine;
//! this seam is consulted once, at request creation, to refuse requests that
//! name unknown references.

use std::collections::BTreeSet;

/// Host-supplied resolver for artifact and museum references.
pub trait DirectoryResolver: Send + Sync {
    fn artifact_exists(&self, artifact_ref: &str) -> bool;
    fn museum_exists(&self, museum_ref: &str) -> bool;
}

/// Accepts every reference. The default when the host wires no directory,
/// and the usual choice in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveDirectory;

impl DirectoryResolver for PermissiveDirectory {
    fn artifact_exists(&self, _artifact_ref: &str) -> bool {
        true
    }

    fn museum_exists(&self, _museum_ref: &str) -> bool {
        true
    }
}

/// A fixed set of known references.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    artifacts: BTreeSet<String>,
    museums: BTreeSet<String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, artifact_ref: impl Into<String>) -> Self {
        self.artifacts.insert(artifact_ref.into());
        self
    }

    pub fn with_museum(mut self, museum_ref: impl Into<String>) -> Self {
        self.museums.insert(museum_ref.into());
        self
    }
}

impl DirectoryResolver for StaticDirectory {
    fn artifact_exists(&self, artifact_ref: &str) -> bool {
        self.artifacts.contains(artifact_ref)
    }

    fn museum_exists(&self, museum_ref: &str) -> bool {
        self.museums.contains(museum_ref)
    }
}
