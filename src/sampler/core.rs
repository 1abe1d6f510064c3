use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cnf::cnf::{Cnf, Lit};
use crate::sampler::combine::{MAX_DEGREE, combine};
use crate::solver::maxsat::MaxSatSolver;
use crate::solver::{MaxSatOracle, SolveResult, SolverStats};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOptions {
    pub max_samples: usize,
    pub max_time: f64,
    pub seed: u64,
    pub progress: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            max_samples: 10_000_000,
            max_time: 7200.0,
            seed: 0,
            progress: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Timeout,
    SampleCap,
    Unsat,
    EmptySupport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleReport {
    pub samples: usize,
    pub epochs: usize,
    pub flips: usize,
    pub forced: usize,
    pub elapsed: f64,
    pub stop: StopReason,
    pub solver: SolverStats,
}

enum Step {
    Sat,
    Unsat,
    Stop(StopReason),
}

enum EpochEnd {
    Continue,
    Stopped(StopReason),
}

pub struct Sampler<O> {
    oracle: O,
    ind: Vec<u32>,
    opts: SampleOptions,
    rng: ChaCha8Rng,
    started: Instant,
    samples: usize,
    epochs: usize,
    flips: usize,
    forced: HashSet<usize>,
}

impl Sampler<MaxSatSolver> {
    pub fn from_cnf(cnf: &Cnf, ind: Vec<u32>, opts: SampleOptions) -> Self {
        Self::new(MaxSatSolver::from_cnf(cnf), ind, opts)
    }
}

impl<O: MaxSatOracle> Sampler<O> {
    pub fn new(oracle: O, ind: Vec<u32>, opts: SampleOptions) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(opts.seed);
        Self {
            oracle,
            ind,
            opts,
            rng,
            started: Instant::now(),
            samples: 0,
            epochs: 0,
            flips: 0,
            forced: HashSet::new(),
        }
    }

    pub fn run(&mut self, sink: &mut dyn Write) -> Result<SampleReport> {
        self.started = Instant::now();
        let base_depth = self.oracle.depth();
        let stop = loop {
            match self.epoch(sink)? {
                EpochEnd::Continue => {}
                EpochEnd::Stopped(reason) => break reason,
            }
        };
        debug_assert_eq!(self.oracle.depth(), base_depth);
        Ok(SampleReport {
            samples: self.samples,
            epochs: self.epochs,
            flips: self.flips,
            forced: self.forced.len(),
            elapsed: self.started.elapsed().as_secs_f64(),
            stop,
            solver: self.oracle.stats(),
        })
    }

    fn limit_reached(&self) -> Option<StopReason> {
        if self.started.elapsed().as_secs_f64() >= self.opts.max_time {
            return Some(StopReason::Timeout);
        }
        if self.samples >= self.opts.max_samples {
            return Some(StopReason::SampleCap);
        }
        None
    }

    // limits are checked before every oracle call; there is no mid-call
    // cancellation
    fn checked_solve(&mut self) -> Step {
        if let Some(reason) = self.limit_reached() {
            return Step::Stop(reason);
        }
        match self.oracle.check() {
            SolveResult::Sat => Step::Sat,
            _ => Step::Unsat,
        }
    }

    fn project_model(&self) -> String {
        let mut bits = String::with_capacity(self.ind.len());
        for &v in &self.ind {
            bits.push(if self.oracle.model_value(v).unwrap_or(false) {
                '1'
            } else {
                '0'
            });
        }
        bits
    }

    fn emit(&mut self, sink: &mut dyn Write, degree: u32, bits: &str) -> Result<()> {
        writeln!(sink, "{}: {}", degree, bits).context("cannot write sample record")?;
        self.samples += 1;
        Ok(())
    }

    fn epoch(&mut self, sink: &mut dyn Write) -> Result<EpochEnd> {
        self.forced.clear();

        // seed: a fair coin per projection variable, as weight-1 preferences
        self.oracle.push();
        for i in 0..self.ind.len() {
            let heads = self.rng.random::<bool>();
            self.oracle.assert_soft(Lit::new(self.ind[i], heads));
        }
        let sigma = match self.checked_solve() {
            Step::Stop(reason) => {
                self.oracle.pop();
                return Ok(EpochEnd::Stopped(reason));
            }
            Step::Unsat => {
                self.oracle.pop();
                return Ok(EpochEnd::Stopped(StopReason::Unsat));
            }
            Step::Sat => {
                let bits = self.project_model();
                self.oracle.pop();
                bits
            }
        };

        self.emit(sink, 0, &sigma)?;

        if self.ind.is_empty() {
            self.epochs += 1;
            return Ok(EpochEnd::Stopped(StopReason::EmptySupport));
        }

        // commit: bias the flip calls toward agreement with the seed
        self.oracle.push();
        for (i, bit) in sigma.bytes().enumerate() {
            self.oracle.assert_soft(Lit::new(self.ind[i], bit == b'1'));
        }

        let mut initial: HashSet<String> = HashSet::new();
        let mut accepted: HashMap<String, u32> = HashMap::new();
        accepted.insert(sigma.clone(), 0);

        for i in 0..self.ind.len() {
            if self.forced.contains(&i) {
                continue;
            }
            self.oracle.push();
            let value = sigma.as_bytes()[i] == b'1';
            self.oracle.assert_hard(&[Lit::new(self.ind[i], !value)]);
            match self.checked_solve() {
                Step::Stop(reason) => {
                    self.oracle.pop();
                    self.oracle.pop();
                    return Ok(EpochEnd::Stopped(reason));
                }
                Step::Unsat => {
                    self.forced.insert(i);
                    self.oracle.pop();
                }
                Step::Sat => {
                    let tau = self.project_model();
                    self.oracle.pop();
                    if initial.insert(tau.clone()) {
                        self.flips += 1;
                        self.emit(sink, 1, &tau)?;
                        let mut fresh: HashMap<String, u32> = HashMap::new();
                        fresh.insert(tau.clone(), 1);
                        for (mutation, &degree) in &accepted {
                            if degree >= MAX_DEGREE {
                                continue;
                            }
                            let candidate = combine(&sigma, mutation, &tau);
                            if accepted.contains_key(&candidate)
                                || fresh.contains_key(&candidate)
                            {
                                continue;
                            }
                            self.emit(sink, degree + 1, &candidate)?;
                            fresh.insert(candidate, degree + 1);
                        }
                        for (bits, degree) in fresh {
                            accepted.insert(bits, degree);
                        }
                    }
                }
            }
        }

        self.oracle.pop();
        self.epochs += 1;
        if self.opts.progress {
            println!(
                "epoch={} samples={} flips={} forced={} calls={} elapsed={:.3}",
                self.epochs,
                self.samples,
                self.flips,
                self.forced.len(),
                self.oracle.stats().solve_calls,
                self.started.elapsed().as_secs_f64()
            );
        }
        Ok(EpochEnd::Continue)
    }
}
