//! Fingerprint cache coherency tests.
//!
//! Every node shares one state keeper per analysis: the expensive control
//! coefficient recomputation must run exactly once per distinct steady state,
//! however many nodes are read.

use std::cell::RefCell;
use std::rc::Rc;

use symca_patterns::{
    algebra::parse, AnalysisContext, Coefficient, ExpressionNode, Fingerprint, Node, TableModel,
};

struct Fixture {
    model: Rc<RefCell<TableModel>>,
    ctx: AnalysisContext,
    sigma: Rc<ExpressionNode>,
    cc: Coefficient,
}

/// `(J_R1 - J_R2)/(J_R1 + J_R2)` with J_R1 = 3, J_R2 = 1 and no solver
fn fixture() -> Fixture {
    let model = Rc::new(RefCell::new(
        TableModel::new("toy", ["R1", "R2"], ["S"])
            .with_flux("R1", 3.0)
            .unwrap()
            .with_flux("R2", 1.0)
            .unwrap()
            .with_steady_state("S", 2.0)
            .unwrap(),
    ));
    let ctx = AnalysisContext::from_shared(model.clone()).unwrap();
    let sigma = Rc::new(ExpressionNode::new(&ctx, "Sigma", parse("J_R1 + J_R2").unwrap()).unwrap());
    let cc = Coefficient::new(&ctx, "ccJ", parse("J_R1 - J_R2").unwrap(), &sigma).unwrap();
    Fixture {
        model,
        ctx,
        sigma,
        cc,
    }
}

fn runs(f: &Fixture) -> u64 {
    f.model.borrow().counters().control_coefficient_runs
}

fn read_everything(f: &Fixture) -> f64 {
    for pattern in f.cc.control_patterns() {
        pattern.value().unwrap();
    }
    f.sigma.value().unwrap();
    f.cc.value().unwrap()
}

#[test]
fn test_repeated_reads_never_recompute() {
    let f = fixture();
    for _ in 0..5 {
        assert!((read_everything(&f) - 0.5).abs() < 1e-12);
    }
    assert_eq!(runs(&f), 0);
    assert_eq!(f.ctx.state_keeper().recomputations(), 0);
}

#[test]
fn test_state_change_recomputes_once_across_nodes() {
    let f = fixture();
    read_everything(&f);

    f.model.borrow_mut().set_flux("R1", 5.0).unwrap();
    let value = read_everything(&f);
    assert!((value - 4.0 / 6.0).abs() < 1e-12);
    assert_eq!(runs(&f), 1);

    // Further reads at the new state are free
    read_everything(&f);
    assert_eq!(runs(&f), 1);
    assert_eq!(f.ctx.state_keeper().recomputations(), 1);
}

#[test]
fn test_cached_fingerprint_follows_reads() {
    let f = fixture();
    let before = f.cc.cached_fingerprint();
    assert_eq!(before, Fingerprint::from_values(vec![3.0, 1.0, 2.0]));

    f.model.borrow_mut().set_steady_state("S", 2.5).unwrap();
    assert_eq!(f.cc.cached_fingerprint(), before);

    f.cc.value().unwrap();
    assert_eq!(
        f.cc.cached_fingerprint(),
        Fingerprint::from_values(vec![3.0, 1.0, 2.5])
    );
    assert_eq!(f.ctx.state_keeper().last_state(), &f.cc.cached_fingerprint());
}

#[test]
fn test_returning_to_earlier_state_recomputes() {
    let f = fixture();
    read_everything(&f);

    f.model.borrow_mut().set_flux("R1", 4.0).unwrap();
    read_everything(&f);
    f.model.borrow_mut().set_flux("R1", 3.0).unwrap();
    read_everything(&f);

    // Only the most recent state is remembered
    assert_eq!(runs(&f), 2);
}

#[test]
fn test_tiny_perturbation_counts_as_change() {
    let f = fixture();
    f.cc.value().unwrap();

    f.model
        .borrow_mut()
        .set_flux("R2", 1.0 + f64::EPSILON)
        .unwrap();
    f.cc.value().unwrap();
    assert_eq!(runs(&f), 1);
}

#[test]
fn test_nan_fingerprint_always_reads_as_changed() {
    let f = fixture();
    f.model.borrow_mut().set_flux("R1", f64::NAN).unwrap();

    assert!(f.sigma.value().unwrap().is_nan());
    assert!(f.sigma.value().unwrap().is_nan());
    assert_eq!(runs(&f), 2);
}

#[test]
fn test_failed_recompute_propagates_and_keeps_state() {
    let model = Rc::new(RefCell::new(
        TableModel::new("failing", ["R1"], Vec::<String>::new())
            .with_flux("R1", 1.0)
            .unwrap()
            .with_solver(|_| anyhow::bail!("steady state did not converge")),
    ));
    let ctx = AnalysisContext::from_shared(model.clone()).unwrap();
    let node = ExpressionNode::new(&ctx, "J", parse("J_R1").unwrap()).unwrap();
    let initial = ctx.state_keeper().last_state().clone();

    model.borrow_mut().set_flux("R1", 2.0).unwrap();
    let err = node.value().unwrap_err();
    assert!(err.to_string().contains("converge"));
    assert_eq!(ctx.state_keeper().last_state(), &initial);
    assert_eq!(node.cached_fingerprint(), initial);
    assert!(!model.borrow().is_quiet());
}
