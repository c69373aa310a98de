//! Scanning the profile blob for dive records.

use core::iter::FusedIterator;

use thiserror::Error;

/// Marker opening a dive header.
pub const HEADER_START: [u8; 2] = [0xFA, 0xFA];

/// Marker closing a dive header.
pub const HEADER_END: [u8; 2] = [0xFB, 0xFB];

/// Marker closing a dive body.
pub const TERMINATOR: [u8; 2] = [0xFD, 0xFD];

/// Header version of the short layout.
pub const VERSION_SHORT: u8 = 0x20;

/// Header version adding the deco debug divisor.
pub const VERSION_LONG: u8 = 0x21;

/// Length of a short header, including both markers.
pub const SHORT_HEADER_LEN: usize = 47;

/// Length of a header with the deco debug divisor, including both markers.
pub const LONG_HEADER_LEN: usize = 57;

/// Header length for a version byte, if the version is known.
pub fn header_len(version: u8) -> Option<usize> {
    match version {
        VERSION_SHORT => Some(SHORT_HEADER_LEN),
        VERSION_LONG => Some(LONG_HEADER_LEN),
        _ => None,
    }
}

/// An error framing a dive record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A header start marker followed by an unknown version byte.
    #[error("Unknown header version ({version:#04x}) at offset {offset}.")]
    UnknownHeaderVersion { offset: usize, version: u8 },
}

/// Header and body bytes of a single dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiveRecordBytes<'a> {
    /// Offset of the header within the profile blob.
    pub offset: usize,
    /// Header bytes, from start marker to end marker.
    pub header: &'a [u8],
    /// Body bytes, including the terminator.
    pub body: &'a [u8],
}

/// Iterator over the dive records of a profile blob, in storage order.
///
/// Bytes before the first complete header are skipped. This is where the
/// device leaves the remains of its oldest, overwritten dive.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    r: &'a [u8],
    i: usize,
}

impl<'a> Frames<'a> {
    pub fn new(profile: &'a [u8]) -> Self {
        Self { r: profile, i: 0 }
    }

    fn finish(&mut self) -> Option<<Self as Iterator>::Item> {
        self.i = self.r.len();
        None
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<DiveRecordBytes<'a>, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(start) = find(&self.r[self.i..], HEADER_START).map(|p| self.i + p) else {
                return self.finish();
            };

            let Some(&version) = self.r.get(start + 2) else {
                return self.finish();
            };

            // A run of start bytes, the marker is the last two.
            if version == HEADER_START[0] {
                self.i = start + 1;
                continue;
            }

            let Some(len) = header_len(version) else {
                // The header length is what is unknown, so look for the
                // next start marker instead of skipping a fixed amount.
                self.i = start + 1;
                return Some(Err(FrameError::UnknownHeaderVersion {
                    offset: start,
                    version,
                }));
            };

            let end = start + len;
            if self.r.get(end - 2..end) != Some(&HEADER_END[..]) {
                self.i = start + 1;
                continue;
            }

            // A body holds at least one byte before its terminator.
            let Some(t) = self.r.get(end + 1..).and_then(|r| find(r, TERMINATOR)) else {
                return self.finish();
            };

            let body_end = end + 1 + t + TERMINATOR.len();
            self.i = body_end;

            return Some(Ok(DiveRecordBytes {
                offset: start,
                header: &self.r[start..end],
                body: &self.r[end..body_end],
            }));
        }
    }
}

impl FusedIterator for Frames<'_> {}

/// Position of the first occurrence of a marker.
fn find(r: &[u8], marker: [u8; 2]) -> Option<usize> {
    r.windows(2).position(|w| w == &marker[..])
}
