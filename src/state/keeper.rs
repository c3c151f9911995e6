//! Gate for the expensive control coefficient recomputation.

use anyhow::Result;

use super::Fingerprint;
use crate::model::Model;

/// Remembers the fingerprint of the last control coefficient recomputation.
///
/// Only the single most recent fingerprint is kept: returning to a state seen
/// earlier than that recomputes again.
#[derive(Debug, Clone)]
pub struct StateKeeper {
    last_state_for_mca: Fingerprint,
    recomputations: u64,
}

impl StateKeeper {
    /// Create a keeper seeded with the model's current fingerprint
    pub fn new(state: Fingerprint) -> Self {
        Self {
            last_state_for_mca: state,
            recomputations: 0,
        }
    }

    /// Recompute control coefficients if `state` differs from the last one seen.
    ///
    /// The recomputation runs with solver logging suppressed. On failure the
    /// stored fingerprint is left unchanged.
    pub fn do_mca_state<M: Model + ?Sized>(&mut self, model: &mut M, state: &Fingerprint) -> Result<()> {
        if *state != self.last_state_for_mca {
            log::debug!(
                "Steady state changed, recomputing control coefficients (#{})",
                self.recomputations + 1
            );
            model.set_quiet(true);
            let recomputed = model.recompute_control_coefficients();
            model.set_quiet(false);
            recomputed?;
            self.last_state_for_mca = state.clone();
            self.recomputations += 1;
        }
        Ok(())
    }

    /// Fingerprint of the last recomputation
    pub fn last_state(&self) -> &Fingerprint {
        &self.last_state_for_mca
    }

    /// Recomputations triggered through this keeper
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableModel;

    fn fp(values: &[f64]) -> Fingerprint {
        Fingerprint::from_values(values.to_vec())
    }

    #[test]
    fn test_same_state_does_not_recompute() {
        let mut model = TableModel::new("m", ["R1"], Vec::<String>::new());
        let mut keeper = StateKeeper::new(fp(&[1.0]));
        keeper.do_mca_state(&mut model, &fp(&[1.0])).unwrap();
        assert_eq!(model.counters().control_coefficient_runs, 0);
        assert_eq!(keeper.recomputations(), 0);
    }

    #[test]
    fn test_changed_state_recomputes_once() {
        let mut model = TableModel::new("m", ["R1"], Vec::<String>::new());
        let mut keeper = StateKeeper::new(fp(&[1.0]));
        keeper.do_mca_state(&mut model, &fp(&[2.0])).unwrap();
        keeper.do_mca_state(&mut model, &fp(&[2.0])).unwrap();
        assert_eq!(model.counters().control_coefficient_runs, 1);
        assert_eq!(keeper.last_state(), &fp(&[2.0]));
        assert!(!model.is_quiet());
    }

    #[test]
    fn test_only_latest_state_is_remembered() {
        let mut model = TableModel::new("m", ["R1"], Vec::<String>::new());
        let mut keeper = StateKeeper::new(fp(&[1.0]));
        keeper.do_mca_state(&mut model, &fp(&[2.0])).unwrap();
        keeper.do_mca_state(&mut model, &fp(&[1.0])).unwrap();
        assert_eq!(model.counters().control_coefficient_runs, 2);
    }

    #[test]
    fn test_failed_recompute_keeps_previous_state() {
        let mut model = TableModel::new("m", ["R1"], Vec::<String>::new())
            .with_solver(|_| anyhow::bail!("solver diverged"));
        let mut keeper = StateKeeper::new(fp(&[1.0]));
        assert!(keeper.do_mca_state(&mut model, &fp(&[2.0])).is_err());
        assert_eq!(keeper.last_state(), &fp(&[1.0]));
        assert_eq!(keeper.recomputations(), 0);
    }
}
