use crate::cnf::cnf::Lit;
use crate::solver::varisat::VarisatSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub act: Lit,
}

pub fn open_scope(solver: &mut VarisatSolver) -> Scope {
    let v = solver.fresh_var();
    Scope {
        act: Lit::new(v, true),
    }
}

// clause is active only while the scope literal is assumed true
pub fn add_scoped_clause(solver: &mut VarisatSolver, scope: &Scope, clause: &[Lit]) {
    let mut scoped = Vec::with_capacity(clause.len() + 1);
    scoped.push(scope.act.neg());
    scoped.extend_from_slice(clause);
    solver.add_lits(&scoped);
}

pub fn close_scope(solver: &mut VarisatSolver, scope: Scope) {
    solver.add_lits(&[scope.act.neg()]);
}
