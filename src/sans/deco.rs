//! Decompression periods over decoded samples.
//!
//! The device stores deco depth and time only on the samples scheduled by
//! the deco divisor. A period opens on a sample reporting a stop within a
//! meter of the current depth, and closes on a sample reporting that the
//! stop is done, left, or no longer required.

use core::ops::Range;

use super::sample::{DiveSample, NO_DECO_TIME};

/// Whether a sample opens a decompression period.
pub fn starts(sample: &DiveSample) -> bool {
    match (sample.deco_depth, sample.deco_time) {
        (Some(depth), Some(time)) => {
            depth > 0 && time > 0 && sample.depth - f32::from(depth) <= 1.0
        }
        _ => false,
    }
}

/// Whether a sample closes a decompression period.
pub fn ends(sample: &DiveSample) -> bool {
    let Some(time) = sample.deco_time else {
        return false;
    };

    let depth = sample.deco_depth.unwrap_or(0);

    sample.depth - f32::from(depth) > 1.0 || depth == 0 || time == NO_DECO_TIME || time == 0
}

/// Mark every sample within a decompression period.
pub fn annotate(samples: &mut [DiveSample]) {
    let mut deco = false;

    for sample in samples {
        if deco && ends(sample) {
            deco = false;
        } else if !deco && starts(sample) {
            deco = true;
        }

        sample.deco_alarm = deco;
    }
}

/// Index ranges of contiguous annotated samples.
pub fn periods(samples: &[DiveSample]) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut i = 0;

    core::iter::from_fn(move || {
        let start = i + samples[i..].iter().position(|s| s.deco_alarm)?;
        let len = samples[start..]
            .iter()
            .position(|s| !s.deco_alarm)
            .unwrap_or(samples.len() - start);

        i = start + len;
        Some(start..i)
    })
}
