//! Breakpoint reconciliation against the execution engine.
//!
//! The registry holds the desired breakpoints per source file and line.
//! While the session is still configuring, the engine has not loaded the
//! module yet and cannot accept breakpoint calls, so changes are recorded
//! as pending handles and applied in one `sync` pass at the transition to
//! running. Once running, changes go out immediately.

use crate::engine::{BreakpointId, EngineControl};
use crate::index::{CodePosition, DebugIndices};
use crate::logging;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Shared handler for remote failures that are localized to a single
/// breakpoint rather than fatal to the session.
pub type ErrorHandler = Box<dyn FnMut(&str)>;

/// A registry entry for one requested breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointHandle {
    /// Applied on the engine under this identifier.
    Resolved(BreakpointId),
    /// Will be applied at this code position when `sync` runs.
    Pending(CodePosition),
}

/// Whether a change is sent to the engine right away or queued until sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Immediate,
    Deferred,
}

/// Verification status reported back per requested line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStatus {
    pub line: u32,
    /// False when the line has no code position or every remote call for
    /// it failed; the breakpoint is reported as "not verified", never as
    /// an error.
    pub verified: bool,
}

/// Owns the per-file breakpoint registry. All mutation goes through
/// [`update_breakpoints`](Self::update_breakpoints) and
/// [`sync`](Self::sync); callers serialize those per session.
pub struct BreakpointManager {
    registry: HashMap<PathBuf, BTreeMap<u32, Vec<BreakpointHandle>>>,
    /// Handles displaced in deferred mode. Their registry lines are gone
    /// already; only the remote side-effect waits for sync.
    deferred_removals: Vec<BreakpointHandle>,
    on_error: ErrorHandler,
}

impl BreakpointManager {
    pub fn new(on_error: ErrorHandler) -> Self {
        Self {
            registry: HashMap::new(),
            deferred_removals: Vec::new(),
            on_error,
        }
    }

    /// Reconcile the desired `lines` for `file` against the registry.
    ///
    /// Lines present before and after keep their handles untouched, so
    /// repeating the same set issues no remote calls. Dropped lines are
    /// removed from the registry at once; in immediate mode their resolved
    /// handles are deleted on the engine now, in deferred mode the
    /// displaced handles queue up for `sync`. New lines resolve through
    /// the source-to-code index; a line with no code position is skipped
    /// and reported unverified.
    pub fn update_breakpoints<E: EngineControl>(
        &mut self,
        engine: &mut E,
        indices: &DebugIndices,
        file: &Path,
        lines: &[u32],
        mode: UpdateMode,
    ) -> Vec<LineStatus> {
        let old = self.registry.remove(file).unwrap_or_default();
        let requested: BTreeSet<u32> = lines.iter().copied().collect();
        let mut kept: BTreeMap<u32, Vec<BreakpointHandle>> = BTreeMap::new();

        for (line, handles) in old {
            if requested.contains(&line) {
                kept.insert(line, handles);
            } else {
                logging::log_breakpoint_cleared(file, line);
                self.discard_handles(engine, handles, mode);
            }
        }

        for &line in &requested {
            if kept.contains_key(&line) {
                continue;
            }
            let positions = indices.code_positions(file, line);
            if positions.is_empty() {
                logging::log_line_unresolved(file, line);
                continue;
            }
            let mut handles = Vec::with_capacity(positions.len());
            for &position in positions {
                match mode {
                    UpdateMode::Deferred => handles.push(BreakpointHandle::Pending(position)),
                    UpdateMode::Immediate => match engine.add_breakpoint(position) {
                        Ok(id) => handles.push(BreakpointHandle::Resolved(id)),
                        Err(err) => (self.on_error)(&format!("set breakpoint failed: {err}")),
                    },
                }
            }
            if !handles.is_empty() {
                logging::log_breakpoint_set(file, line);
                kept.insert(line, handles);
            }
        }

        let statuses = lines
            .iter()
            .map(|&line| LineStatus {
                line,
                verified: kept.contains_key(&line),
            })
            .collect();

        if !kept.is_empty() {
            self.registry.insert(file.to_path_buf(), kept);
        }
        statuses
    }

    fn discard_handles<E: EngineControl>(
        &mut self,
        engine: &mut E,
        handles: Vec<BreakpointHandle>,
        mode: UpdateMode,
    ) {
        match mode {
            UpdateMode::Deferred => self.deferred_removals.extend(handles),
            UpdateMode::Immediate => {
                for handle in handles {
                    // A pending handle was never applied; dropping it is
                    // the whole removal.
                    if let BreakpointHandle::Resolved(id) = handle {
                        if let Err(err) = engine.delete_breakpoint(id) {
                            (self.on_error)(&format!("remove breakpoint failed: {err}"));
                        }
                    }
                }
            }
        }
    }

    /// Apply every deferred change. Invoked exactly once, at the
    /// transition from configuring to running.
    ///
    /// Queued removals go first, then every stored line's pending handles
    /// resolve in line order. A handle whose remote call fails is dropped
    /// and its line pruned if nothing remains; sibling lines proceed.
    pub fn sync<E: EngineControl>(&mut self, engine: &mut E) {
        let Self {
            registry,
            deferred_removals,
            on_error,
        } = self;

        let mut removed = 0;
        for handle in deferred_removals.drain(..) {
            if let BreakpointHandle::Resolved(id) = handle {
                removed += 1;
                if let Err(err) = engine.delete_breakpoint(id) {
                    on_error(&format!("remove breakpoint failed: {err}"));
                }
            }
        }

        let mut applied = 0;
        for lines in registry.values_mut() {
            lines.retain(|_line, handles| {
                let mut resolved = Vec::with_capacity(handles.len());
                for handle in handles.iter() {
                    match handle {
                        BreakpointHandle::Resolved(id) => {
                            resolved.push(BreakpointHandle::Resolved(*id));
                        }
                        BreakpointHandle::Pending(position) => {
                            match engine.add_breakpoint(*position) {
                                Ok(id) => {
                                    applied += 1;
                                    resolved.push(BreakpointHandle::Resolved(id));
                                }
                                Err(err) => {
                                    on_error(&format!("set breakpoint failed: {err}"));
                                }
                            }
                        }
                    }
                }
                *handles = resolved;
                !handles.is_empty()
            });
        }
        registry.retain(|_, lines| !lines.is_empty());
        logging::log_breakpoints_synced(applied, removed);
    }

    /// Handles currently stored for one line.
    pub fn handles(&self, file: &Path, line: u32) -> &[BreakpointHandle] {
        self.registry
            .get(file)
            .and_then(|lines| lines.get(&line))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Lines with at least one handle for one file.
    pub fn lines(&self, file: &Path) -> Vec<u32> {
        self.registry
            .get(file)
            .map(|lines| lines.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of removals queued for the next sync.
    pub fn deferred_removal_count(&self) -> usize {
        self.deferred_removals.len()
    }

    /// Drop all registry state. Used when the session disconnects.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.deferred_removals.clear();
    }
}
