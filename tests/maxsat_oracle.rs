use cnfsampler::cnf::cnf::{Cnf, Lit};
use cnfsampler::solver::maxsat::MaxSatSolver;
use cnfsampler::solver::{MaxSatOracle, SolveResult};

fn or_clause() -> Cnf {
    let mut cnf = Cnf::new(2);
    cnf.add_clause(vec![Lit::new(1, true), Lit::new(2, true)]);
    cnf
}

#[test]
fn consistent_preferences_are_honored() {
    let mut oracle = MaxSatSolver::from_cnf(&or_clause());
    oracle.push();
    oracle.assert_soft(Lit::new(1, true));
    oracle.assert_soft(Lit::new(2, false));
    assert_eq!(oracle.check(), SolveResult::Sat);
    assert_eq!(oracle.model_value(1), Some(true));
    assert_eq!(oracle.model_value(2), Some(false));
    oracle.pop();
    assert_eq!(oracle.depth(), 0);
}

#[test]
fn conflicting_preferences_relax_instead_of_failing() {
    let mut oracle = MaxSatSolver::from_cnf(&or_clause());
    oracle.push();
    oracle.assert_soft(Lit::new(1, false));
    oracle.assert_soft(Lit::new(2, false));
    assert_eq!(oracle.check(), SolveResult::Sat);
    let v1 = oracle.model_value(1).expect("assigned");
    let v2 = oracle.model_value(2).expect("assigned");
    assert!(v1 || v2, "model must satisfy the hard clause");
    assert!(!(v1 && v2), "only one preference should be given up");
    oracle.pop();
}

#[test]
fn hard_conflict_is_unsat_and_scoped() {
    let mut cnf = Cnf::new(1);
    cnf.add_clause(vec![Lit::new(1, true)]);
    let mut oracle = MaxSatSolver::from_cnf(&cnf);

    oracle.push();
    oracle.assert_hard(&[Lit::new(1, false)]);
    assert_eq!(oracle.check(), SolveResult::Unsat);
    oracle.pop();

    assert_eq!(oracle.check(), SolveResult::Sat);
    assert_eq!(oracle.model_value(1), Some(true));
    assert_eq!(oracle.depth(), 0);
}

#[test]
fn soft_conflict_with_hard_unit_still_solves() {
    let mut cnf = Cnf::new(1);
    cnf.add_clause(vec![Lit::new(1, true)]);
    let mut oracle = MaxSatSolver::from_cnf(&cnf);
    oracle.push();
    oracle.assert_soft(Lit::new(1, false));
    assert_eq!(oracle.check(), SolveResult::Sat);
    assert_eq!(oracle.model_value(1), Some(true));
    oracle.pop();
}

#[test]
fn preferences_die_with_their_scope() {
    let mut oracle = MaxSatSolver::from_cnf(&or_clause());
    oracle.push();
    oracle.assert_soft(Lit::new(1, true));
    oracle.push();
    oracle.assert_soft(Lit::new(2, true));
    assert_eq!(oracle.check(), SolveResult::Sat);
    assert_eq!(oracle.model_value(1), Some(true));
    assert_eq!(oracle.model_value(2), Some(true));
    oracle.pop();
    assert_eq!(oracle.depth(), 1);
    assert_eq!(oracle.check(), SolveResult::Sat);
    assert_eq!(oracle.model_value(1), Some(true));
    oracle.pop();
    assert_eq!(oracle.depth(), 0);
}

#[test]
fn unsatisfiable_formula_is_unsat_with_any_preferences() {
    let mut cnf = Cnf::new(1);
    cnf.add_clause(vec![Lit::new(1, true)]);
    cnf.add_clause(vec![Lit::new(1, false)]);
    let mut oracle = MaxSatSolver::from_cnf(&cnf);
    oracle.push();
    oracle.assert_soft(Lit::new(1, true));
    assert_eq!(oracle.check(), SolveResult::Unsat);
    oracle.pop();
}
