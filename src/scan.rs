//! Definition Scanning - Compilation Unit Boundary
//!
//! The scanner is an external collaborator: it supplies the candidate
//! definitions found in the current compilation unit. The environment
//! carries the ambient load context, rebound around each loader call and
//! restored on every exit path.

use crate::model::CandidateDefinition;
use std::cell::RefCell;

/// Supplies the candidate definitions of the current compilation unit.
///
/// Read-only; called at most once per pass.
pub trait DefinitionScanner {
    fn find_candidates(&self) -> Vec<CandidateDefinition>;
}

/// Ambient compilation environment handed to model loaders by reference.
#[derive(Debug)]
pub struct ScanEnvironment {
    unit_name: String,
    active_context: RefCell<Option<String>>,
}

impl ScanEnvironment {
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            active_context: RefCell::new(None),
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// The load context currently bound, if any.
    pub fn active_context(&self) -> Option<String> {
        self.active_context.borrow().clone()
    }

    /// Bind a load context for the lifetime of the returned guard.
    ///
    /// The prior context is restored when the guard drops, including on
    /// early returns and unwinds.
    pub fn bind_context(&self, context: impl Into<String>) -> ContextGuard<'_> {
        let prior = self.active_context.replace(Some(context.into()));
        ContextGuard { slot: &self.active_context, prior }
    }
}

/// Restores the previously bound load context on drop.
pub struct ContextGuard<'a> {
    slot: &'a RefCell<Option<String>>,
    prior: Option<String>,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        *self.slot.borrow_mut() = self.prior.take();
    }
}
