use crate::cnf::cnf::{Cnf, Lit};
use crate::solver::scope::{Scope, add_scoped_clause, close_scope, open_scope};
use crate::solver::varisat::VarisatSolver;
use crate::solver::{MaxSatOracle, SatOracle, SolveResult, SolverStats};

struct Frame {
    scope: Scope,
    softs: Vec<Lit>,
}

pub struct MaxSatSolver {
    sat: VarisatSolver,
    frames: Vec<Frame>,
    root_softs: Vec<Lit>,
}

impl MaxSatSolver {
    pub fn new() -> Self {
        Self {
            sat: VarisatSolver::new(),
            frames: Vec::new(),
            root_softs: Vec::new(),
        }
    }

    pub fn from_cnf(cnf: &Cnf) -> Self {
        Self {
            sat: VarisatSolver::from_cnf(cnf),
            frames: Vec::new(),
            root_softs: Vec::new(),
        }
    }
}

impl Default for MaxSatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxSatOracle for MaxSatSolver {
    fn push(&mut self) {
        let scope = open_scope(&mut self.sat);
        self.frames.push(Frame {
            scope,
            softs: Vec::new(),
        });
    }

    fn pop(&mut self) {
        if let Some(frame) = self.frames.pop() {
            close_scope(&mut self.sat, frame.scope);
        }
    }

    fn assert_hard(&mut self, clause: &[Lit]) {
        match self.frames.last() {
            Some(frame) => {
                let scope = frame.scope;
                add_scoped_clause(&mut self.sat, &scope, clause);
            }
            None => self.sat.add_lits(clause),
        }
    }

    fn assert_soft(&mut self, lit: Lit) {
        match self.frames.last_mut() {
            Some(frame) => frame.softs.push(lit),
            None => self.root_softs.push(lit),
        }
    }

    // Deletion-based linear search: assume every soft preference, and while
    // the result is unsat relax one preference named by the failed core.
    // Unsat with no preference in the core is a hard unsat.
    fn check(&mut self) -> SolveResult {
        let mut active: Vec<Lit> = self.root_softs.clone();
        for frame in &self.frames {
            active.extend_from_slice(&frame.softs);
        }
        loop {
            let mut assumptions: Vec<Lit> =
                self.frames.iter().map(|f| f.scope.act).collect();
            assumptions.extend_from_slice(&active);
            match self.sat.solve_assuming(&assumptions) {
                SolveResult::Sat => return SolveResult::Sat,
                SolveResult::Unknown => return SolveResult::Unsat,
                SolveResult::Unsat => {
                    let core = self.sat.failed_core();
                    let Some(idx) = active.iter().position(|l| core.contains(l)) else {
                        return SolveResult::Unsat;
                    };
                    active.remove(idx);
                }
            }
        }
    }

    fn model_value(&self, var: u32) -> Option<bool> {
        SatOracle::model_value(&self.sat, var)
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn stats(&self) -> SolverStats {
        SatOracle::stats(&self.sat)
    }
}
