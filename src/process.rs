//! Per-frame baseline correction and noise rejection

use crate::error::ProcessError;
use crate::{NOISE_FLOOR, TAXELS, THRESHOLD_MU, THRESHOLD_SIGMA_SQ};

/// Subtract the baseline from one raw frame and reject noise.
///
/// The reference is truncated to integer before subtraction. Deltas at or
/// below the per-channel floor go to zero, then the whole frame is zeroed
/// when the post-floor mean stays at or below `THRESHOLD_MU` while the
/// variance reaches `THRESHOLD_SIGMA_SQ`.
pub fn calibrate(raw: &[u16], reference: &[f64; TAXELS]) -> Result<[i32; TAXELS], ProcessError> {
    if raw.len() != TAXELS {
        return Err(ProcessError::BadLength {
            expected: TAXELS,
            actual: raw.len(),
        });
    }
    let mut delta = [0i32; TAXELS];
    for i in 0..TAXELS {
        let d = raw[i] as i32 - reference[i] as i32;
        delta[i] = if d <= NOISE_FLOOR { 0 } else { d };
    }
    // The conjunction (small mean AND large variance) matches the deployed
    // publisher; confirm against hardware before changing its direction.
    if mean(&delta) <= THRESHOLD_MU && variance(&delta) >= THRESHOLD_SIGMA_SQ {
        delta = [0i32; TAXELS];
    }
    Ok(delta)
}

fn mean(frame: &[i32; TAXELS]) -> f64 {
    frame.iter().sum::<i32>() as f64 / TAXELS as f64
}

fn variance(frame: &[i32; TAXELS]) -> f64 {
    let mu = mean(frame);
    frame
        .iter()
        .map(|&v| {
            let d = v as f64 - mu;
            d * d
        })
        .sum::<f64>()
        / TAXELS as f64
}
