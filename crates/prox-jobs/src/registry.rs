//! Dedup registry for equivalent job paths.
//!
//! Keyed by (timestamp, identifier, path): multiple producers may derive
//! the same awoken job from different sleeping ancestors; only the first
//! registration wins, so the job is enqueued exactly once.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use prox_core::Timestamp;

use crate::error::JobError;
use crate::path::{LookAheadJobIdentifier, LookAheadJobPath};

// ── Path tree ─────────────────────────────────────────────────────────────────

/// One node per path prefix; children keyed by branch priority.
#[derive(Debug, Default)]
struct PathTreeNode {
    registered: bool,
    children: BTreeMap<usize, PathTreeNode>,
}

impl PathTreeNode {
    /// Walk `path` to depth, creating nodes; register the terminal.
    /// Returns false when the terminal (or an ancestor) was already
    /// registered.
    fn try_register(&mut self, depth: usize, path: &LookAheadJobPath) -> bool {
        if self.registered {
            return false;
        }
        if depth == 0 {
            self.registered = true;
            return true;
        }
        let priority = path.priority(path.len() - depth);
        self.children
            .entry(priority)
            .or_default()
            .try_register(depth - 1, path)
    }

    fn has_registered(&self, depth: usize, path: &LookAheadJobPath) -> bool {
        if depth == 0 {
            return self.registered;
        }
        let priority = path.priority(path.len() - depth);
        match self.children.get(&priority) {
            Some(child) => child.has_registered(depth - 1, path),
            None => false,
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegistryEntry {
    timestamp: Timestamp,
    id_trees: HashMap<LookAheadJobIdentifier, PathTreeNode>,
}

/// Tracks which (timestamp, id, path) combinations have been handed out.
#[derive(Debug, Default)]
pub struct LookAheadJobRegistry {
    entries: Mutex<VecDeque<RegistryEntry>>,
}

impl LookAheadJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` at (timestamp, id).
    ///
    /// Returns `Ok(true)` exactly once per combination; `Ok(false)` for a
    /// duplicate.  A timestamp older than the newest entry and absent from
    /// the log is an invariant violation.
    pub fn try_register(
        &self,
        timestamp: Timestamp,
        id: &LookAheadJobIdentifier,
        path: &LookAheadJobPath,
    ) -> Result<bool, JobError> {
        let mut entries = self.entries.lock().unwrap();
        let has_newer = entries.back().is_some_and(|last| last.timestamp >= timestamp);
        let entry = if has_newer {
            entries
                .iter_mut()
                .rev()
                .find(|e| e.timestamp == timestamp)
                .ok_or(JobError::StaleRegistryTimestamp(timestamp))?
        } else {
            entries.push_back(RegistryEntry { timestamp, ..Default::default() });
            entries.back_mut().expect("just pushed")
        };
        let tree = entry.id_trees.entry(id.clone()).or_default();
        Ok(tree.try_register(path.len(), path))
    }

    /// Read-only lookup of a registered path.
    pub fn has_registered(
        &self,
        timestamp: Timestamp,
        id: &LookAheadJobIdentifier,
        path: &LookAheadJobPath,
    ) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .rev()
            .find(|e| e.timestamp == timestamp)
            .and_then(|e| e.id_trees.get(id))
            .is_some_and(|tree| tree.has_registered(path.len(), path))
    }
}
