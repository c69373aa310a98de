//! Fixed-layout dive header.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use super::{
    cursor::Cursor,
    frame::{self, HEADER_END, HEADER_START, VERSION_LONG, VERSION_SHORT},
};

/// An error decoding a dive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Unknown header version.
    #[error("Unknown header version ({0:#04x}).")]
    UnknownVersion(u8),
    /// Header length does not match its version.
    #[error("Expected a header of {expected} bytes, found {found}.")]
    Length { expected: usize, found: usize },
    /// Missing start or end marker.
    #[error("Missing header marker.")]
    Marker,
}

/// Optional per-sample fields, in the order they follow the event data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Deco,
    Tank,
    Ppo2,
    DecoDebug,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Temperature,
        Channel::Deco,
        Channel::Tank,
        Channel::Ppo2,
        Channel::DecoDebug,
    ];
}

/// Split a divisor byte into its sampling period and payload width.
///
/// A period of zero means the field is never present.
pub fn divisor(value: u8) -> (u8, u8) {
    bitfield! {
        struct Divisor(u8) {
            [0..4] period: u8,
            [4..8] width: u8,
        }
    }

    let divisor = Divisor(value);
    (divisor.period(), divisor.width())
}

/// Oxygen and helium fractions of a breathing gas, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GasMix {
    pub o2: u8,
    pub he: u8,
}

/// Decoded dive header.
///
/// Date and time fields record the end of the dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiveHeader {
    pub version: u8,
    pub month: u8,
    pub day: u8,
    /// Years since 2000.
    pub year: u8,
    pub hour: u8,
    pub minute: u8,
    /// Maximum depth in centimeters.
    pub max_depth: u16,
    pub dive_time_m: u16,
    pub dive_time_s: u8,
    /// Minimum temperature in tenths of a degree.
    pub min_temperature: u16,
    /// Surface pressure in millibars.
    pub surface_pressure: u16,
    /// Desaturation time in minutes.
    pub desaturation: u16,
    pub gases: [GasMix; 6],
    /// Index of the gas at the start of the dive.
    pub gas: u8,
    pub firmware: (u8, u8),
    /// Battery voltage in millivolts.
    pub voltage: u16,
    /// Seconds between samples.
    pub sampling: u8,
    /// Divisor bytes, indexed in [`Channel::ALL`] order.
    pub divisors: [u8; 5],
}

impl DiveHeader {
    /// The divisor byte of an optional sample field.
    pub fn divisor(&self, channel: Channel) -> u8 {
        self.divisors[channel as usize]
    }

    /// Nominal dive duration in seconds.
    pub fn duration(&self) -> u32 {
        u32::from(self.dive_time_m) * 60 + u32::from(self.dive_time_s)
    }

    pub fn max_depth_m(&self) -> f32 {
        f32::from(self.max_depth) / 100.0
    }

    pub fn min_temperature_c(&self) -> f32 {
        f32::from(self.min_temperature) / 10.0
    }

    /// Time the device recorded the dive, at its end.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        let duration = TimeDelta::try_seconds(i64::from(self.duration()))?;
        self.end_time()?.checked_sub_signed(duration)
    }
}

const COMMON_LEN: usize = 41;

#[repr(C, packed)]
#[derive(FromBytes)]
struct CommonLayout {
    start: [u8; 2],
    version: u8,
    month: u8,
    day: u8,
    year: u8,
    hour: u8,
    minute: u8,
    max_depth: [u8; 2],
    dive_time_m: [u8; 2],
    dive_time_s: u8,
    min_temperature: [u8; 2],
    surface_pressure: [u8; 2],
    desaturation: [u8; 2],
    gases: [[u8; 2]; 6],
    gas: u8,
    firmware: [u8; 2],
    voltage: [u8; 2],
    sampling: u8,
    divisors: [u8; 4],
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct ShortTail {
    _reserved: [u8; 2],
    _spare: [u8; 2],
    end: [u8; 2],
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct LongTail {
    deco_debug: u8,
    _reserved: [u8; 13],
    end: [u8; 2],
}

/// Decode a dive header, from start marker to end marker.
pub fn decode(r: &[u8]) -> Result<DiveHeader, HeaderError> {
    let version = *r.get(2).ok_or(HeaderError::Length {
        expected: frame::SHORT_HEADER_LEN,
        found: r.len(),
    })?;

    let expected = frame::header_len(version).ok_or(HeaderError::UnknownVersion(version))?;
    let length = HeaderError::Length {
        expected,
        found: r.len(),
    };

    if r.len() != expected {
        Err(length)?;
    }

    let mut c = Cursor::new(r);

    let bytes = c.take::<COMMON_LEN>().map_err(|_| length)?;
    let CommonLayout {
        start,
        month,
        day,
        year,
        hour,
        minute,
        max_depth,
        dive_time_m,
        dive_time_s,
        min_temperature,
        surface_pressure,
        desaturation,
        gases,
        gas,
        firmware,
        voltage,
        sampling,
        divisors,
        ..
    } = zerocopy::transmute!(bytes);

    let tail: Either<ShortTail, LongTail> = match version {
        VERSION_SHORT => {
            let bytes = c.take::<6>().map_err(|_| length)?;
            Left(zerocopy::transmute!(bytes))
        }
        VERSION_LONG => {
            let bytes = c.take::<16>().map_err(|_| length)?;
            Right(zerocopy::transmute!(bytes))
        }
        _ => Err(HeaderError::UnknownVersion(version))?,
    };

    let (end, deco_debug) = match tail {
        Left(ShortTail { end, .. }) => (end, 0),
        Right(LongTail {
            end, deco_debug, ..
        }) => (end, deco_debug),
    };

    if start != HEADER_START || end != HEADER_END {
        Err(HeaderError::Marker)?;
    }

    let [t, d, k, p] = divisors;

    Ok(DiveHeader {
        version,
        month,
        day,
        year,
        hour,
        minute,
        max_depth: u16::from_le_bytes(max_depth),
        dive_time_m: u16::from_le_bytes(dive_time_m),
        dive_time_s,
        min_temperature: u16::from_le_bytes(min_temperature),
        surface_pressure: u16::from_le_bytes(surface_pressure),
        desaturation: u16::from_le_bytes(desaturation),
        gases: gases.map(|[o2, he]| GasMix { o2, he }),
        gas,
        firmware: (firmware[0], firmware[1]),
        voltage: u16::from_le_bytes(voltage),
        sampling,
        divisors: [t, d, k, p, deco_debug],
    })
}
