use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cnfsampler::cnf::dimacs::parse_dimacs;
use cnfsampler::sampler::core::{SampleOptions, Sampler, StopReason};
use cnfsampler::verify::check::{CheckOptions, check_samples};
use cnfsampler::verify::plan::DEGREE_BUCKETS;

#[derive(Debug, Parser)]
#[command(name = "cnfsampler")]
#[command(about = "Samples satisfying assignments of a CNF over its independent variables")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    Sample {
        path: String,
        #[arg(short = 'n', long, default_value_t = 10_000_000)]
        max_samples: usize,
        #[arg(short = 't', long, default_value_t = 7200.0)]
        max_time: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    Check {
        path: String,
        #[arg(long, default_value_t = 3600.0)]
        timeout: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Cmd::Sample {
            path,
            max_samples,
            max_time,
            seed,
            progress,
        } => sample_cmd(&path, max_samples, max_time, seed, progress),
        Cmd::Check {
            path,
            timeout,
            seed,
        } => check_cmd(&path, timeout, seed),
    }
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn sample_cmd(
    path: &str,
    max_samples: usize,
    max_time: f64,
    seed: Option<u64>,
    progress: bool,
) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read CNF file {path}"))?;
    let instance = parse_dimacs(&text)?;

    let out_path = format!("{path}.samples");
    let file = File::create(&out_path).with_context(|| format!("cannot create {out_path}"))?;
    let mut sink = BufWriter::new(file);

    let opts = SampleOptions {
        max_samples,
        max_time,
        seed: seed.unwrap_or_else(wall_clock_seed),
        progress,
    };
    let mut sampler = Sampler::from_cnf(&instance.cnf, instance.ind, opts);
    let report = sampler.run(&mut sink)?;
    sink.flush().context("cannot flush sample file")?;

    match report.stop {
        StopReason::Unsat => println!("could not find a solution"),
        StopReason::Timeout => println!("stopping: timeout"),
        StopReason::SampleCap => println!("stopping: samples"),
        StopReason::EmptySupport => println!("stopping: empty projection"),
    }
    println!(
        "samples={} epochs={} flips={} forced={} calls={}",
        report.samples, report.epochs, report.flips, report.forced, report.solver.solve_calls
    );
    println!(
        "elapsed={:.3}s solver={:.3}s",
        report.elapsed,
        report.solver.solver_time.as_secs_f64()
    );
    Ok(())
}

fn check_cmd(path: &str, timeout: f64, seed: Option<u64>) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read CNF file {path}"))?;
    let instance = parse_dimacs(&text)?;

    let samples_path = format!("{path}.samples");
    let samples = fs::read_to_string(&samples_path)
        .with_context(|| format!("cannot read {samples_path}"))?;

    let valid_path = format!("{path}.samples.valid");
    let file = File::create(&valid_path).with_context(|| format!("cannot create {valid_path}"))?;
    let mut valid_out = BufWriter::new(file);

    let opts = CheckOptions {
        budget: timeout,
        seed: seed.unwrap_or_else(wall_clock_seed),
    };
    let report = check_samples(&instance.cnf, &instance.ind, &samples, &mut valid_out, &opts)?;
    valid_out
        .flush()
        .context("cannot flush validated sample file")?;

    println!("step={:.6}s probability={:.6}", report.step, report.probability);
    for n in 0..DEGREE_BUCKETS {
        println!(
            "degree={} valid={} invalid={} total={}",
            n, report.valid[n], report.invalid[n], report.total[n]
        );
    }
    println!("yield={:.6}", report.yield_estimate());
    for (hits, count) in report.good.iter().enumerate() {
        println!("valid_reuse={} count={}", hits, count);
    }
    for (hits, count) in report.bad.iter().enumerate() {
        println!("invalid_reuse={} count={}", hits, count);
    }
    println!(
        "checked={} calls={} unknown={}",
        report.checked, report.calls, report.unknown
    );
    println!(
        "elapsed={:.3}s solver={:.3}s",
        report.elapsed, report.solver_time
    );
    Ok(())
}
