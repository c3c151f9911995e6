//! Fingerprint-invalidated value cache shared by all node kinds.

use std::cell::{Cell, RefCell};

use anyhow::Result;

use crate::state::{AnalysisContext, Fingerprint};

/// Lazily computed node value tied to the steady state it was computed for.
///
/// On every read:
/// 1. a changed fingerprint lets the state keeper recompute control
///    coefficients, then the value is recalculated and the fingerprint stored;
/// 2. an unchanged fingerprint with no value, or a value of exactly `0.0`,
///    recalculates without involving the state keeper;
/// 3. otherwise the cached value is returned.
///
/// Zero counting as "not yet computed" means a node whose true value is zero
/// recalculates on every read.
#[derive(Debug)]
pub struct ValueCache {
    value: Cell<Option<f64>>,
    fingerprint: RefCell<Fingerprint>,
}

impl ValueCache {
    /// Empty cache valid for `fingerprint`
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            value: Cell::new(None),
            fingerprint: RefCell::new(fingerprint),
        }
    }

    /// Read through the cache, calling `calc` when the value is stale or unset
    pub fn read<F>(&self, ctx: &AnalysisContext, name: &str, calc: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        let current = ctx.snapshot()?;
        let changed = current != *self.fingerprint.borrow();
        if changed {
            log::debug!("{}: steady state changed, recalculating", name);
            ctx.ensure_mca_state(&current)?;
        }

        let value = match self.value.get() {
            Some(v) if !changed && v != 0.0 => v,
            _ => {
                let v = calc()?;
                self.value.set(Some(v));
                v
            }
        };

        if changed {
            *self.fingerprint.borrow_mut() = current;
        }
        Ok(value)
    }

    /// Store a value computed outside the fingerprint check
    pub fn store(&self, value: f64) {
        self.value.set(Some(value));
    }

    /// Cached value without any check
    pub fn peek(&self) -> Option<f64> {
        self.value.get()
    }

    /// Fingerprint the cached value was computed for
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint.borrow().clone()
    }
}
