// Floating point comparisons, and the bias used for over/under points.
pub const FEQ_EPSILON: f64 = 0.0001;

// Stand-in divisor for near-zero slab directions. Kept finite so that
// `0 * LARGE_DIVISOR` stays 0 instead of turning into NaN.
pub const LARGE_DIVISOR: f64 = 1.0e12;

// Maximum recursion depth for reflected and refracted rays.
pub const DEFAULT_RECURSION_DEPTH: usize = 4;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.5;
