// Deterministic generator committed to by the protocol:
// combined seed -> first 4 bytes (big-endian) -> xorshift32 -> floats in [0,1)
//
// Verifiers must run exactly this algorithm. Shifts are 13/17/5 on a 32-bit
// state with wrapping left shifts and logical right shifts.

/// Substitute state for seed 0, which is a fixed point of xorshift.
pub const ZERO_SEED_STATE: u32 = 0xDEAD_BEEF;

const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { ZERO_SEED_STATE } else { seed };
        Self { state }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next value in [0, 1): `next_u32() / 2^32`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    pub fn next_floats(&mut self, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.next_f64()).collect()
    }
}
