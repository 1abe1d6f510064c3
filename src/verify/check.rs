use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cnf::cnf::{Cnf, Lit};
use crate::cnf::dimacs::sample_literal_line;
use crate::solver::varisat::VarisatSolver;
use crate::solver::{SatOracle, SolveResult};
use crate::verify::plan::{CALIBRATION_SAMPLES, DEGREE_BUCKETS, SubsamplePlan, step_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Valid,
    Invalid,
    Unknown,
}

struct Cell {
    verdict: Verdict,
    hits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOptions {
    pub budget: f64,
    pub seed: u64,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            budget: 3600.0,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub valid: [usize; DEGREE_BUCKETS],
    pub invalid: [usize; DEGREE_BUCKETS],
    pub total: [usize; DEGREE_BUCKETS],
    pub unknown: usize,
    pub checked: usize,
    pub calls: usize,
    pub step: f64,
    pub probability: f64,
    pub good: Vec<usize>,
    pub bad: Vec<usize>,
    pub elapsed: f64,
    pub solver_time: f64,
}

impl CheckReport {
    pub fn yield_estimate(&self) -> f64 {
        let mut weighted = 0.0;
        let mut all = 0usize;
        for n in 0..DEGREE_BUCKETS {
            let decided = self.valid[n] + self.invalid[n];
            if decided > 0 {
                weighted += self.total[n] as f64 * self.valid[n] as f64 / decided as f64;
            }
            all += self.total[n];
        }
        if all == 0 { 0.0 } else { weighted / all as f64 }
    }
}

fn parse_record<'a>(line: &'a str, width: usize) -> Result<(usize, &'a str)> {
    let Some((head, rest)) = line.split_once(':') else {
        bail!("malformed sample record: {}", line);
    };
    let degree: usize = head
        .trim()
        .parse()
        .with_context(|| format!("malformed mutation degree in record: {}", line))?;
    if degree >= DEGREE_BUCKETS {
        bail!("mutation degree {} out of range in record: {}", degree, line);
    }
    let bits = rest.strip_prefix(' ').unwrap_or(rest);
    if bits.len() != width {
        bail!("sample has {} bits, expected {}", bits.len(), width);
    }
    if let Some(b) = bits.bytes().find(|b| *b != b'0' && *b != b'1') {
        bail!("invalid character '{}' in sample bits", b as char);
    }
    Ok((degree, bits))
}

// fresh oracle per candidate, materialised from the parsed clauses
fn check_sample(cnf: &Cnf, ind: &[u32], bits: &str) -> (SolveResult, f64) {
    let started = Instant::now();
    let mut solver = VarisatSolver::from_cnf(cnf);
    for (&v, b) in ind.iter().zip(bits.bytes()) {
        solver.add_clause(&[Lit::new(v, b == b'1')]);
    }
    let result = solver.check();
    (result, started.elapsed().as_secs_f64())
}

pub fn check_samples(
    cnf: &Cnf,
    ind: &[u32],
    samples: &str,
    valid_out: &mut dyn Write,
    opts: &CheckOptions,
) -> Result<CheckReport> {
    let started = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut solver_time = 0.0;

    // calibrate the per-check cost on the leading records
    let mut durations = Vec::with_capacity(CALIBRATION_SAMPLES);
    for line in samples.lines().take(CALIBRATION_SAMPLES) {
        let (_, bits) = parse_record(line, ind.len())?;
        let (_, spent) = check_sample(cnf, ind, bits);
        solver_time += spent;
        durations.push(spent);
    }
    let step = step_time(&durations);

    let mut total = [0usize; DEGREE_BUCKETS];
    for line in samples.lines() {
        let (degree, _) = parse_record(line, ind.len())?;
        total[degree] += 1;
    }

    let plan = SubsamplePlan::new(step, opts.budget, &total);

    let mut hist: HashMap<String, Cell> = HashMap::new();
    let mut valid = [0usize; DEGREE_BUCKETS];
    let mut invalid = [0usize; DEGREE_BUCKETS];
    let mut unknown = 0usize;
    let mut checked = 0usize;
    let mut calls = 0usize;

    for line in samples.lines() {
        let (degree, bits) = parse_record(line, ind.len())?;
        let run1 = rng.random::<f64>() < plan.probability;
        let run2 = plan.bucket[degree] > 0.0 && rng.random::<f64>() < plan.bucket[degree];
        if !run1 && !run2 {
            continue;
        }

        let verdict = match hist.get_mut(bits) {
            Some(cell) => {
                if run1 {
                    cell.hits += 1;
                }
                cell.verdict
            }
            None => {
                let (result, spent) = check_sample(cnf, ind, bits);
                solver_time += spent;
                calls += 1;
                let verdict = match result {
                    SolveResult::Sat => Verdict::Valid,
                    SolveResult::Unsat => Verdict::Invalid,
                    SolveResult::Unknown => Verdict::Unknown,
                };
                hist.insert(
                    bits.to_string(),
                    Cell {
                        verdict,
                        hits: usize::from(run1),
                    },
                );
                verdict
            }
        };

        match verdict {
            Verdict::Valid => valid[degree] += 1,
            Verdict::Invalid => invalid[degree] += 1,
            Verdict::Unknown => unknown += 1,
        }
        checked += 1;
    }

    let mut good: Vec<usize> = Vec::new();
    let mut bad: Vec<usize> = Vec::new();
    for (bits, cell) in &hist {
        match cell.verdict {
            Verdict::Valid => {
                bump(&mut good, cell.hits);
                writeln!(valid_out, "{}", sample_literal_line(ind, bits, cell.hits))
                    .context("cannot write validated sample")?;
            }
            Verdict::Invalid => bump(&mut bad, cell.hits),
            Verdict::Unknown => {}
        }
    }

    Ok(CheckReport {
        valid,
        invalid,
        total,
        unknown,
        checked,
        calls,
        step,
        probability: plan.probability,
        good,
        bad,
        elapsed: started.elapsed().as_secs_f64(),
        solver_time,
    })
}

fn bump(hist: &mut Vec<usize>, hits: usize) {
    if hist.len() <= hits {
        hist.resize(hits + 1, 0);
    }
    hist[hits] += 1;
}
