// Manual-timing benchmark for the parsing pipeline.
//
// Run: cargo bench --bench scan_bench
//
// Compares single-threaded, recovery-wrapped, and parallel parsing across
// clean and quote-heavy inputs of increasing size.

use std::time::{Duration, Instant};

use ocsv::parallel::parse_parallel;
use ocsv::recovery::{parse_with_recovery, RecoveryPolicy};
use ocsv::{parse, Config};

fn generate_clean_rows(num_rows: usize, fields_per_row: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..num_rows {
        for j in 0..fields_per_row {
            if j > 0 {
                out.push(b',');
            }
            out.extend_from_slice(format!("field_{i}_{j}_value").as_bytes());
        }
        out.push(b'\n');
    }
    out
}

fn generate_quoted_rows(num_rows: usize, fields_per_row: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..num_rows {
        for j in 0..fields_per_row {
            if j > 0 {
                out.push(b',');
            }
            out.push(b'"');
            out.extend_from_slice(format!("quoted, field \"\"{i}\"\" {j}").as_bytes());
            out.push(b'"');
        }
        out.push(b'\n');
    }
    out
}

struct BenchResult {
    name: String,
    iterations: u64,
    total_time: Duration,
    input_size: usize,
}

impl BenchResult {
    fn avg_ns(&self) -> f64 {
        self.total_time.as_nanos() as f64 / self.iterations as f64
    }

    fn throughput_mb_s(&self) -> f64 {
        let secs_per_iter = self.avg_ns() / 1_000_000_000.0;
        self.input_size as f64 / secs_per_iter / 1_000_000.0
    }
}

fn bench_fn<F: Fn()>(name: &str, input_size: usize, f: F, warmup_secs: f64, bench_secs: f64) -> BenchResult {
    let warmup_deadline = Instant::now() + Duration::from_secs_f64(warmup_secs);
    while Instant::now() < warmup_deadline {
        f();
    }

    let mut iterations: u64 = 0;
    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(bench_secs);
    while Instant::now() < deadline {
        f();
        iterations += 1;
    }

    BenchResult {
        name: name.to_string(),
        iterations,
        total_time: start.elapsed(),
        input_size,
    }
}

fn print_results(results: &[BenchResult]) {
    let max_name_len = results.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let fastest_ns = results.iter().map(|r| r.avg_ns()).fold(f64::MAX, f64::min);

    for r in results {
        let avg = r.avg_ns();
        let speedup = avg / fastest_ns;
        let marker = if (speedup - 1.0).abs() < 0.01 { " (fastest)" } else { "" };
        println!(
            "  {:<width$}  {:>10.2} µs/iter  {:>8.1} MB/s  {:>6.2}x{}",
            r.name,
            avg / 1000.0,
            r.throughput_mb_s(),
            speedup,
            marker,
            width = max_name_len,
        );
    }
}

fn run_benchmark_suite(label: &str, input: &[u8], warmup: f64, time: f64) {
    println!("\n--- {label} ({} bytes) ---", input.len());

    let results = vec![
        bench_fn(
            "Single-threaded",
            input.len(),
            || {
                let _ = parse(Config::default(), input);
            },
            warmup,
            time,
        ),
        bench_fn(
            "Recovery (fail-fast)",
            input.len(),
            || {
                let _ = parse_with_recovery(Config::default(), RecoveryPolicy::FailFast, input);
            },
            warmup,
            time,
        ),
        bench_fn(
            "Parallel (threshold=0)",
            input.len(),
            || {
                let _ = parse_parallel(Config::default(), input, 0, 0);
            },
            warmup,
            time,
        ),
    ];

    let single = parse(Config::default(), input).unwrap();
    let parallel = parse_parallel(Config::default(), input, 0, 0).unwrap();
    assert_eq!(single, parallel, "parallel output diverged from single-threaded");
    println!("  Output: {} rows (all drivers agree)", single.len());

    print_results(&results);
}

fn main() {
    println!("=== Parsing pipeline benchmark ===");

    let warmup = 0.5;
    let time = 1.5;

    let rows = generate_clean_rows(10_000, 10);
    run_benchmark_suite("10K rows x 10 fields (clean)", &rows, warmup, time);

    let rows = generate_quoted_rows(10_000, 10);
    run_benchmark_suite("10K rows x 10 fields (quoted)", &rows, warmup, time);

    let rows = generate_clean_rows(200_000, 10);
    run_benchmark_suite("200K rows x 10 fields (clean)", &rows, warmup, time);

    println!("\n=== Done ===");
}
