//! Status block preceding the profile blob.

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Signature opening every dump.
pub const PREAMBLE: [u8; 6] = [0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x55];

/// Length of the status block.
pub const STATUS_LEN: usize = 266;

/// Length of the profile blob for first-generation devices.
pub const PROFILE_LEN_MK1: usize = 32768;

/// Length of the profile blob for devices with extended memory.
pub const PROFILE_LEN_MK2: usize = 65536;

/// The dump is too short to hold a status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Dump of {found} bytes is shorter than the 266 byte status block.")]
pub struct TruncatedDump {
    pub found: usize,
}

#[repr(C, packed)]
#[derive(FromBytes, KnownLayout, Immutable)]
struct StatusLayout {
    preamble: [u8; 6],
    settings: [u8; 256],
    voltage: [u8; 2],
    major: u8,
    minor: u8,
}

/// Decoded status block, borrowing the dump.
#[derive(Debug, Clone)]
pub struct StatusBlock<'a> {
    pub preamble: [u8; 6],
    pub settings: Settings<'a>,
    /// Battery voltage in millivolts.
    pub voltage: u16,
    pub firmware_major: u8,
    pub firmware_minor: u8,
    /// Profile blob holding the recorded dives.
    pub profile: &'a [u8],
}

impl StatusBlock<'_> {
    /// Whether the dump opens with the expected signature.
    pub fn has_preamble(&self) -> bool {
        self.preamble == PREAMBLE
    }

    /// Owned summary of the device state.
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            serial: self.settings.serial,
            dive_count: self.settings.dive_count,
            voltage: self.voltage,
            firmware: (self.firmware_major, self.firmware_minor),
        }
    }
}

/// Device settings block.
///
/// Only the leading counters are interpreted; the remaining bytes hold
/// custom function values and are kept opaque.
#[derive(Debug, Clone)]
pub struct Settings<'a> {
    pub serial: u16,
    /// Number of dives recorded over the device lifetime.
    pub dive_count: u16,
    pub data: &'a [u8],
    pub raw: &'a [u8],
}

impl<'a> Settings<'a> {
    fn decode(raw: &'a [u8; 256]) -> Self {
        let (counters, data) = raw.split_at(4);

        Self {
            serial: u16::from_le_bytes([counters[0], counters[1]]),
            dive_count: u16::from_le_bytes([counters[2], counters[3]]),
            data,
            raw: raw.as_slice(),
        }
    }
}

/// Owned summary of a status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceInfo {
    pub serial: u16,
    pub dive_count: u16,
    /// Battery voltage in millivolts.
    pub voltage: u16,
    pub firmware: (u8, u8),
}

/// Decode the status block of a dump.
///
/// The profile blob is the `profile_len` bytes following the status block,
/// or whatever remains of the dump if it is shorter.
pub fn decode(r: &[u8], profile_len: usize) -> Result<StatusBlock<'_>, TruncatedDump> {
    let (layout, rest) =
        StatusLayout::ref_from_prefix(r).map_err(|_| TruncatedDump { found: r.len() })?;

    let profile = rest.get(..profile_len).unwrap_or(rest);

    Ok(StatusBlock {
        preamble: layout.preamble,
        settings: Settings::decode(&layout.settings),
        voltage: u16::from_le_bytes(layout.voltage),
        firmware_major: layout.major,
        firmware_minor: layout.minor,
        profile,
    })
}
