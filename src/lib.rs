pub mod args;
pub mod calibration;
pub mod error;
pub mod process;
pub mod publisher;
pub mod receiver;
pub mod state;

// Set by the sensor array (4x4 grid, one u16 per taxel)
pub const TAXELS: usize = 16;
// Bytes in a well-formed frame
pub const PAYLOAD_SIZE: usize = TAXELS * 2;
// Per-channel deltas at or below this are considered noise
pub const NOISE_FLOOR: i32 = 3;
// Global suppression fires when the frame mean is at or below this
pub const THRESHOLD_MU: f64 = 1.0;
// ...and the frame variance is at or above this (sigma squared)
pub const THRESHOLD_SIGMA_SQ: f64 = 1.0;
