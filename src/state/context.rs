//! Shared analysis context injected into every node.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result};

use super::{Fingerprint, StateKeeper};
use crate::algebra::{Expr, LatexRenderer, Renderer};
use crate::model::Model;

/// Model shared between the caller and every node of an analysis
pub type SharedModel = Rc<RefCell<dyn Model>>;

/// Model, state keeper and renderer of one analysis session.
///
/// Cloning is cheap and shares all three; nodes built from the same context
/// share one [`StateKeeper`]. Independent analyses over different models each
/// get their own context. Single-threaded: borrows of the model are never held
/// across calls back into nodes.
#[derive(Clone)]
pub struct AnalysisContext {
    model: SharedModel,
    state_keeper: Rc<RefCell<StateKeeper>>,
    renderer: Rc<dyn Renderer>,
}

impl AnalysisContext {
    /// Wrap a model; the keeper is seeded with its current fingerprint
    pub fn new<M: Model + 'static>(model: M) -> Result<Self> {
        Self::from_shared(Rc::new(RefCell::new(model)))
    }

    /// Use an already shared model (keeps the caller's handle usable)
    pub fn from_shared(model: SharedModel) -> Result<Self> {
        let state = Fingerprint::capture(&*model.borrow())
            .context("Capturing initial steady-state fingerprint")?;
        Ok(Self {
            model,
            state_keeper: Rc::new(RefCell::new(StateKeeper::new(state))),
            renderer: Rc::new(LatexRenderer),
        })
    }

    /// Replace the renderer used for node display strings
    pub fn with_renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Rc::new(renderer);
        self
    }

    /// Borrow the model
    pub fn model(&self) -> Ref<'_, dyn Model> {
        self.model.borrow()
    }

    /// Borrow the model mutably
    pub fn model_mut(&self) -> RefMut<'_, dyn Model> {
        self.model.borrow_mut()
    }

    /// Shared model handle
    pub fn shared_model(&self) -> SharedModel {
        Rc::clone(&self.model)
    }

    /// Borrow the state keeper
    pub fn state_keeper(&self) -> Ref<'_, StateKeeper> {
        self.state_keeper.borrow()
    }

    /// Current fingerprint of the model
    pub fn snapshot(&self) -> Result<Fingerprint> {
        Fingerprint::capture(&*self.model.borrow())
    }

    /// Let the state keeper recompute control coefficients if `state` is new
    pub fn ensure_mca_state(&self, state: &Fingerprint) -> Result<()> {
        let mut model = self.model.borrow_mut();
        self.state_keeper
            .borrow_mut()
            .do_mca_state(&mut *model, state)
    }

    /// Resolve every free symbol of `expr` against the model and evaluate
    pub fn evaluate(&self, expr: &Expr) -> Result<f64> {
        let model = self.model.borrow();
        let mut values = HashMap::new();
        for symbol in expr.free_symbols() {
            let value = model.symbol_value(&symbol)?;
            values.insert(symbol, value);
        }
        expr.evaluate(&values)
    }

    /// Render an expression for display
    pub fn render(&self, expr: &Expr) -> String {
        self.renderer.render(expr)
    }

    /// Whether two contexts share the same model and state keeper
    pub fn same_analysis(&self, other: &AnalysisContext) -> bool {
        Rc::ptr_eq(&self.state_keeper, &other.state_keeper)
    }
}

impl fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("state_keeper", &*self.state_keeper.borrow())
            .finish_non_exhaustive()
    }
}
