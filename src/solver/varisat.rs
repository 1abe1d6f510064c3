use std::time::Instant;

use varisat::ExtendFormula;

use crate::cnf::cnf::{Cnf, Lit};
use crate::solver::{SatOracle, SolveResult, SolverStats};

pub struct VarisatSolver {
    inner: varisat::Solver<'static>,
    vars: Vec<varisat::Var>,
    values: Vec<Option<bool>>,
    core: Vec<Lit>,
    stats: SolverStats,
}

impl VarisatSolver {
    pub fn new() -> Self {
        Self {
            inner: varisat::Solver::new(),
            vars: Vec::new(),
            values: Vec::new(),
            core: Vec::new(),
            stats: SolverStats::default(),
        }
    }

    pub fn from_cnf(cnf: &Cnf) -> Self {
        let mut solver = Self::new();
        solver.ensure_var(cnf.num_vars);
        for clause in &cnf.clauses {
            solver.add_lits(clause);
        }
        solver
    }

    pub fn fresh_var(&mut self) -> u32 {
        let v = self.inner.new_var();
        self.vars.push(v);
        self.vars.len() as u32
    }

    fn ensure_var(&mut self, var: u32) {
        while (self.vars.len() as u32) < var {
            let v = self.inner.new_var();
            self.vars.push(v);
        }
    }

    fn to_lit(&mut self, lit: Lit) -> varisat::Lit {
        self.ensure_var(lit.var);
        varisat::Lit::from_var(self.vars[lit.var as usize - 1], lit.sign)
    }

    pub fn add_lits(&mut self, clause: &[Lit]) {
        let lits: Vec<varisat::Lit> = clause.iter().map(|&l| self.to_lit(l)).collect();
        self.inner.add_clause(&lits);
    }

    pub fn solve_assuming(&mut self, assumptions: &[Lit]) -> SolveResult {
        let lits: Vec<varisat::Lit> = assumptions.iter().map(|&l| self.to_lit(l)).collect();
        self.inner.assume(&lits);
        self.stats.solve_calls += 1;
        let started = Instant::now();
        let solved = self.inner.solve();
        self.stats.solver_time += started.elapsed();
        self.values.clear();
        self.core.clear();
        match solved {
            Ok(true) => {
                if let Some(model) = self.inner.model() {
                    self.values = vec![None; self.vars.len()];
                    for l in model {
                        let idx = l.var().index();
                        if idx < self.values.len() {
                            self.values[idx] = Some(l.is_positive());
                        }
                    }
                }
                SolveResult::Sat
            }
            Ok(false) => {
                if let Some(core) = self.inner.failed_core() {
                    self.core = core
                        .iter()
                        .map(|l| Lit::new(l.var().index() as u32 + 1, l.is_positive()))
                        .collect();
                }
                SolveResult::Unsat
            }
            Err(_) => SolveResult::Unknown,
        }
    }

    // subset of the last solve's assumptions that made it unsat
    pub fn failed_core(&self) -> &[Lit] {
        &self.core
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatOracle for VarisatSolver {
    fn add_clause(&mut self, clause: &[Lit]) {
        self.add_lits(clause);
    }

    fn check(&mut self) -> SolveResult {
        self.solve_assuming(&[])
    }

    fn model_value(&self, var: u32) -> Option<bool> {
        if var == 0 {
            return None;
        }
        self.values.get(var as usize - 1).copied().flatten()
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }
}
