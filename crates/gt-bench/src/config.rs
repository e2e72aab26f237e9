/// Fixed parameters of the timing run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Side length of the square matrices A, B and D.
    pub n: usize,
    /// Value bound to the scalar placeholder C.
    pub scalar: f32,
    /// Inclusive lower bound of the integer samples.
    pub low: i32,
    /// Exclusive upper bound of the integer samples.
    pub high: i32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            n: 20,
            scalar: 3.0,
            low: -5,
            high: 5,
        }
    }
}
