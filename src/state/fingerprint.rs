//! Steady-state fingerprint.

use anyhow::Result;
use serde::Serialize;

use crate::model::Model;

/// Snapshot of every flux (in reaction order) followed by every steady-state
/// concentration (in species order).
///
/// Equality is exact elementwise float comparison with no tolerance. A NaN
/// entry never compares equal, so a fingerprint containing NaN always reads
/// as changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Fingerprint(Vec<f64>);

impl Fingerprint {
    /// Capture the model's current fingerprint
    pub fn capture<M: Model + ?Sized>(model: &M) -> Result<Self> {
        let mut values = Vec::with_capacity(model.reactions().len() + model.species().len());
        for reaction in model.reactions() {
            values.push(model.flux(reaction)?);
        }
        for species in model.species() {
            values.push(model.steady_state(species)?);
        }
        Ok(Self(values))
    }

    /// Fingerprint from raw values
    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Captured values
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of captured values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty (model without reactions or species)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableModel;

    #[test]
    fn test_capture_order_fluxes_then_species() {
        let model = TableModel::new("m", ["R1", "R2"], ["S"])
            .with_flux("R1", 1.0)
            .unwrap()
            .with_flux("R2", 2.0)
            .unwrap()
            .with_steady_state("S", 3.0)
            .unwrap();
        let fp = Fingerprint::capture(&model).unwrap();
        assert_eq!(fp.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_exact_equality_without_tolerance() {
        let a = Fingerprint::from_values(vec![1.0, 2.0]);
        let b = Fingerprint::from_values(vec![1.0, 2.0 + f64::EPSILON * 2.0]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_nan_never_equal() {
        let a = Fingerprint::from_values(vec![f64::NAN]);
        assert_ne!(a, a.clone());
    }
}
