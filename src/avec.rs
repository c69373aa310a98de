//! Convenience interfaces for decoding whole dumps.
//!
//! The functions in this module drive every stage in [`crate::sans`] over
//! a dump and return one entry per framed dive, in storage order. Dives
//! that cannot be decoded are returned as a [`SkippedDive`] in their place,
//! so one corrupted record never hides the rest of the logbook.
//!
//! ```
//! let (status, dives) = ostc_dump::decode_dump(&data, PROFILE_LEN_MK1)?;
//!
//! for dive in dives {
//!     match dive {
//!         Ok(dive) => println!("{} {:.1} m", dive.start_time, dive.max_depth),
//!         Err(skipped) => eprintln!("{skipped}"),
//!     }
//! }
//! ```

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

use alloc::vec::Vec;
use core::ops::Range;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::sans::{
    cursor::OutOfData,
    deco,
    header::{DiveHeader, GasMix, HeaderError},
    sample::{DiveSample, SampleError},
};

/// A decoded dive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedDive {
    /// Offset of the dive record within the profile blob.
    pub offset: usize,
    pub start_time: NaiveDateTime,
    /// Maximum depth in meters.
    pub max_depth: f32,
    /// Nominal dive duration in seconds.
    pub duration: u32,
    /// Minimum temperature in degrees.
    pub min_temperature: f32,
    /// Seconds between samples.
    pub sampling: u8,
    /// Surface pressure in millibars.
    pub surface_pressure: u16,
    /// Desaturation time in minutes.
    pub desaturation: u16,
    pub gases: [GasMix; 6],
    pub initial_gas: u8,
    pub samples: Vec<DiveSample>,
    /// Whether the body ended with the terminator marker.
    ///
    /// Records framed by [`crate::sans::frame::Frames`] always end with it,
    /// so this is only ever `false` for bodies passed to
    /// [`slice::decode_record`] from elsewhere.
    pub terminated: bool,
}

impl DecodedDive {
    /// Samples with their time offset from the start of the dive, in
    /// seconds.
    pub fn waypoints(&self) -> impl Iterator<Item = (u32, &DiveSample)> + '_ {
        let sampling = u32::from(self.sampling);
        (0..).map(move |i: u32| i * sampling).zip(&self.samples)
    }

    /// Sample index ranges of the decompression periods.
    pub fn deco_periods(&self) -> Vec<Range<usize>> {
        deco::periods(&self.samples).collect()
    }
}

/// An error decoding a single dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiveError {
    /// The header version byte selects no known layout.
    #[error("Unknown header version ({0:#04x}).")]
    UnknownHeaderVersion(u8),
    /// Malformed header.
    #[error("Malformed header: {0}")]
    Header(HeaderError),
    /// A sample's byte accounting does not match its flag byte.
    #[error("Invalid sample {sample}: announced {expected} extra bytes, consumed {consumed}.")]
    InvalidDive {
        sample: u32,
        expected: u8,
        consumed: usize,
    },
    /// The sample body ended in the middle of a sample.
    #[error("Sample body ended unexpectedly.")]
    OutOfData,
    /// Header date and time fields do not form a valid time.
    #[error("Invalid dive date or time.")]
    InvalidTimestamp,
}

impl From<HeaderError> for DiveError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::UnknownVersion(version) => Self::UnknownHeaderVersion(version),
            err => Self::Header(err),
        }
    }
}

impl From<SampleError> for DiveError {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::InvalidDive {
                sample,
                expected,
                consumed,
            } => Self::InvalidDive {
                sample,
                expected,
                consumed,
            },
            SampleError::OutOfData(OutOfData) => Self::OutOfData,
        }
    }
}

/// A dive left out of the decoded logbook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Skipped dive at offset {offset}: {error}")]
pub struct SkippedDive {
    /// Offset of the dive record within the profile blob.
    pub offset: usize,
    /// The dive header, if it could be decoded.
    pub header: Option<DiveHeader>,
    #[source]
    pub error: DiveError,
}
