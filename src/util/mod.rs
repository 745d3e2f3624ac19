pub mod clock;
pub mod env;
pub mod telemetry;

/// Performs `&str` comparisons in constant time (for equal lengths) so the bridge token can't be
/// recovered byte-by-byte from response timings
pub fn constant_time_cmp(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let diff = a
        .bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (l, r)| acc | std::hint::black_box(l ^ r));

    std::hint::black_box(diff) == 0
}
