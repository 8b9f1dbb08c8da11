// Search linearity benchmark for the buffer engine
// index_of/last_index_of must stay linear in attacker-controlled input:
// the external watchdog is the only timeout backstop.

use std::time::{Duration, Instant};

use snipbox::buffer::encoding::Encoding;
use snipbox::{ByteBuffer, Needle};

const ITERATIONS: usize = 50;
const WARMUP_ITERATIONS: usize = 5;

struct LatencyStats {
    p50: Duration,
    p95: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();
        let sum: Duration = samples.iter().sum();
        Self {
            p50: samples[(len as f64 * 0.50) as usize],
            p95: samples[(len as f64 * 0.95) as usize],
            mean: sum / len as u32,
        }
    }

    fn print(&self, label: &str) {
        println!("\n{}", label);
        println!("  p50:  {:?}", self.p50);
        println!("  p95:  {:?}", self.p95);
        println!("  mean: {:?}", self.mean);
    }
}

/// Worst case for naive search: periodic haystack, near-periodic needle.
fn pathological_input(size: usize) -> (ByteBuffer, Needle) {
    let hay = "ab".repeat(size / 2) + "ac";
    let needle = "ab".repeat(63) + "ac";
    (
        ByteBuffer::from_text(&hay, Encoding::Utf8),
        Needle::Text(needle),
    )
}

fn time_search(size: usize) -> LatencyStats {
    let (buf, needle) = pathological_input(size);
    for _ in 0..WARMUP_ITERATIONS {
        let _ = buf.index_of(&needle, None, None).unwrap();
    }
    let mut samples = Vec::with_capacity(ITERATIONS);
    for _ in 0..ITERATIONS {
        let start = Instant::now();
        let found = buf.index_of(&needle, None, None).unwrap();
        let back = buf.last_index_of(&needle, None, None).unwrap();
        samples.push(start.elapsed());
        assert_eq!(found, back);
    }
    LatencyStats::from_samples(samples)
}

fn main() {
    println!("=== snipbox search linearity benchmark ===");
    println!(
        "Iterations: {} (after {} warmup)",
        ITERATIONS, WARMUP_ITERATIONS
    );

    let small = time_search(1 << 16);
    small.print("periodic haystack, 64 KiB");
    let large = time_search(1 << 20);
    large.print("periodic haystack, 1 MiB");

    // 16x the input should cost roughly 16x, never ~256x. The factor
    // leaves generous headroom for noise while still catching a
    // quadratic regression.
    let ratio = large.mean.as_nanos() as f64 / small.mean.as_nanos().max(1) as f64;
    println!("\nmean growth for 16x input: {:.1}x", ratio);
    if ratio < 64.0 {
        println!("search growth is linear-ish; budget met");
        std::process::exit(0);
    } else {
        println!("search growth looks superlinear; budget exceeded");
        std::process::exit(1);
    }
}
