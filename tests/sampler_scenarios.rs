use cnfsampler::cnf::cnf::{Cnf, Lit};
use cnfsampler::cnf::dimacs::{Instance, parse_dimacs};
use cnfsampler::sampler::core::{SampleOptions, SampleReport, Sampler, StopReason};
use cnfsampler::solver::varisat::VarisatSolver;
use cnfsampler::solver::{SatOracle, SolveResult};

fn run_sampler(text: &str, max_samples: usize) -> (Vec<(u32, String)>, SampleReport, Instance) {
    let instance = parse_dimacs(text).expect("parse");
    let opts = SampleOptions {
        max_samples,
        max_time: 600.0,
        seed: 7,
        progress: false,
    };
    let mut sampler = Sampler::from_cnf(&instance.cnf, instance.ind.clone(), opts);
    let mut sink = Vec::new();
    let report = sampler.run(&mut sink).expect("run");
    let out = String::from_utf8(sink).expect("utf8");
    let records = out
        .lines()
        .map(|l| {
            let (n, bits) = l.split_once(": ").expect("record shape");
            (n.parse::<u32>().expect("degree"), bits.to_string())
        })
        .collect();
    (records, report, instance)
}

fn assignment_is_satisfiable(cnf: &Cnf, ind: &[u32], bits: &str) -> bool {
    let mut solver = VarisatSolver::from_cnf(cnf);
    for (&v, b) in ind.iter().zip(bits.bytes()) {
        solver.add_clause(&[Lit::new(v, b == b'1')]);
    }
    solver.check() == SolveResult::Sat
}

#[test]
fn unit_clause_yields_only_the_forced_seed() {
    let (records, report, _) = run_sampler("1 0\n", 1);
    assert_eq!(records, vec![(0, "1".to_string())]);
    assert_eq!(report.stop, StopReason::SampleCap);
}

#[test]
fn forced_formula_repeats_the_seed_across_epochs() {
    let (records, report, _) = run_sampler("1 0\n", 3);
    assert_eq!(records.len(), 3);
    for (degree, bits) in &records {
        assert_eq!((*degree, bits.as_str()), (0, "1"));
    }
    assert!(report.epochs >= 2);
    assert_eq!(report.flips, 0);
}

#[test]
fn exactly_one_of_two_flips_to_the_complement() {
    let text = "c ind 1 2 0\n1 2 0\n-1 -2 0\n";
    let (records, report, instance) = run_sampler(text, 2);
    assert_eq!(records.len(), 2);
    let (d0, seed) = &records[0];
    let (d1, flip) = &records[1];
    assert_eq!(*d0, 0);
    assert_eq!(*d1, 1);
    assert!(seed == "10" || seed == "01");
    let complement: String = seed
        .bytes()
        .map(|b| if b == b'0' { '1' } else { '0' })
        .collect();
    assert_eq!(flip, &complement);
    for (_, bits) in &records {
        assert!(assignment_is_satisfiable(&instance.cnf, &instance.ind, bits));
    }
    assert_eq!(report.stop, StopReason::SampleCap);
}

#[test]
fn forced_positions_produce_no_mutations() {
    let text = "c ind 1 2 3 0\n1 0\n2 0\n3 0\n";
    let (records, report, _) = run_sampler(text, 2);
    assert_eq!(records.len(), 2);
    for (degree, bits) in &records {
        assert_eq!(*degree, 0);
        assert_eq!(bits, "111");
    }
    assert_eq!(report.flips, 0);
}

#[test]
fn free_cube_never_repeats_within_an_epoch() {
    let text = "c ind 1 2 3 0\n";
    let (records, report, instance) = run_sampler(text, 60);
    assert!(records.len() >= 60);
    let mut epoch: Vec<String> = Vec::new();
    for (degree, bits) in &records {
        assert!(*degree <= 6);
        assert_eq!(bits.len(), 3);
        if *degree == 0 {
            epoch.clear();
        }
        assert!(!epoch.contains(bits), "duplicate record within an epoch");
        epoch.push(bits.clone());
        if *degree <= 1 {
            assert!(assignment_is_satisfiable(&instance.cnf, &instance.ind, bits));
        }
    }
    assert!(report.epochs >= 2);
}

#[test]
fn sample_cap_of_one_stops_after_the_seed() {
    let (records, report, _) = run_sampler("c ind 1 2 3 0\n", 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, 0);
    assert_eq!(report.stop, StopReason::SampleCap);
}

#[test]
fn empty_projection_emits_one_empty_record_and_stops() {
    let (records, report, _) = run_sampler("p cnf 0 0\n", 100);
    assert_eq!(records, vec![(0, String::new())]);
    assert_eq!(report.stop, StopReason::EmptySupport);
    assert_eq!(report.epochs, 1);
}

#[test]
fn unsatisfiable_formula_stops_with_no_solution() {
    let text = "1 0\n-1 0\n";
    let (records, report, _) = run_sampler(text, 100);
    assert!(records.is_empty());
    assert_eq!(report.stop, StopReason::Unsat);
}

#[test]
fn zero_time_budget_stops_before_any_record() {
    let instance = parse_dimacs("1 0\n").expect("parse");
    let opts = SampleOptions {
        max_samples: 100,
        max_time: 0.0,
        seed: 1,
        progress: false,
    };
    let mut sampler = Sampler::from_cnf(&instance.cnf, instance.ind, opts);
    let mut sink = Vec::new();
    let report = sampler.run(&mut sink).expect("run");
    assert_eq!(report.stop, StopReason::Timeout);
    assert!(sink.is_empty());
}
