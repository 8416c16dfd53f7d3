//! Benchmark driver comparing `RedBlackMap` with the standard library's ordered map.
//!
//! Takes one optional argument `shift` (default 10) and runs `2^shift` operations per
//! phase: shuffled insertions, a full copy, a clear, lookups, shuffled removals, and a
//! shuffled mix of all three, timing each phase for both containers.

use ordered_collections::red_black_tree::RedBlackMap;
use rand::{Rng, SeedableRng, XorShiftRng};
use std::collections::BTreeMap;
use std::env;
use std::process;
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
enum Operation {
    Insert,
    Lookup,
    Remove,
}

fn report(label: &str, duration: Duration) {
    println!("{:>32}: {:?}", label, duration);
}

fn parse_shift() -> u32 {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| String::from("bench"));

    let shift = match args.next() {
        Some(argument) => match argument.parse() {
            Ok(shift) if shift < 32 => shift,
            _ => {
                eprintln!("Usage: {} [shift]", program);
                process::exit(2);
            }
        },
        None => 10,
    };

    if args.next().is_some() {
        eprintln!("Usage: {} [shift]", program);
        process::exit(2);
    }

    shift
}

fn main() {
    let shift = parse_shift();
    let count = 1i64 << shift;

    let mut rng: XorShiftRng = SeedableRng::from_seed([1, 1, 1, 1]);

    let mut keys: Vec<i64> = (0..count).collect();
    rng.shuffle(&mut keys);

    let mut std_map = BTreeMap::new();
    let mut map = RedBlackMap::new();

    let start = Instant::now();
    for &key in &keys {
        std_map.insert(key, -key);
    }
    report("BTreeMap insertions", start.elapsed());

    let start = Instant::now();
    for &key in &keys {
        map.insert(key, -key).expect("allocation failed");
    }
    report("RedBlackMap insertions", start.elapsed());

    let start = Instant::now();
    let mut std_map_copy = std_map.clone();
    report("BTreeMap copy", start.elapsed());

    let start = Instant::now();
    let mut map_copy = map.try_clone().expect("allocation failed");
    report("RedBlackMap copy", start.elapsed());

    let start = Instant::now();
    std_map_copy.clear();
    report("BTreeMap clear", start.elapsed());

    let start = Instant::now();
    map_copy.clear();
    report("RedBlackMap clear", start.elapsed());

    let mut std_sum = 0i64;
    let start = Instant::now();
    for &key in &keys {
        if let Some(value) = std_map.get(&key) {
            std_sum += *value;
        }
    }
    report("BTreeMap lookups", start.elapsed());

    let mut sum = 0i64;
    let start = Instant::now();
    for &key in &keys {
        if let Some(value) = map.get(&key) {
            sum += *value;
        }
    }
    report("RedBlackMap lookups", start.elapsed());

    assert_eq!(std_sum, sum);

    rng.shuffle(&mut keys);

    let start = Instant::now();
    for &key in &keys {
        std_map.remove(&key);
    }
    report("BTreeMap removals", start.elapsed());

    let start = Instant::now();
    for &key in &keys {
        map.remove(&key);
    }
    report("RedBlackMap removals", start.elapsed());

    assert!(std_map.is_empty());
    assert!(map.is_empty());

    let mut operations = Vec::with_capacity(3 * count as usize);
    for key in 0..count {
        operations.push((Operation::Insert, key));
        operations.push((Operation::Lookup, key));
        operations.push((Operation::Remove, key));
    }
    rng.shuffle(&mut operations);

    let mut std_sum = 0i64;
    let start = Instant::now();
    for &(operation, key) in &operations {
        match operation {
            Operation::Insert => {
                std_map.insert(key, -key);
            }
            Operation::Lookup => {
                if let Some(value) = std_map.get(&key) {
                    std_sum += *value;
                }
            }
            Operation::Remove => {
                std_map.remove(&key);
            }
        }
    }
    report("BTreeMap random operations", start.elapsed());

    let mut sum = 0i64;
    let start = Instant::now();
    for &(operation, key) in &operations {
        match operation {
            Operation::Insert => {
                map.insert(key, -key).expect("allocation failed");
            }
            Operation::Lookup => {
                if let Some(value) = map.get(&key) {
                    sum += *value;
                }
            }
            Operation::Remove => {
                map.remove(&key);
            }
        }
    }
    report("RedBlackMap random operations", start.elapsed());

    assert_eq!(std_sum, sum);
}
