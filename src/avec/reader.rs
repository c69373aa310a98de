//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{
    io::{self, Read},
    vec,
    vec::Vec,
};

use thiserror::Error;

use crate::sans::status::{DeviceInfo, STATUS_LEN, TruncatedDump};

use super::{DecodedDive, SkippedDive, slice};

extern crate std;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader, including ending before a whole
    /// dump was read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The dump size does not fit in memory.
    #[error("Profile length of {0} bytes is too large.")]
    ProfileLen(usize),
}

impl From<TruncatedDump> for Error {
    fn from(err: TruncatedDump) -> Self {
        Self::Io(io::Error::new(io::ErrorKind::UnexpectedEof, err))
    }
}

/// Decode a dump from a reader, such as the serial line a device sends it
/// over.
///
/// Reads exactly one status block and `profile_len` bytes of profile data.
///
/// This method is also re-exported as `ostc_dump::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(
    r: &mut impl Read,
    profile_len: usize,
) -> Result<(DeviceInfo, Vec<Result<DecodedDive, SkippedDive>>), Error> {
    let len = STATUS_LEN
        .checked_add(profile_len)
        .ok_or(Error::ProfileLen(profile_len))?;

    let mut buf = vec![0; len];
    r.read_exact(&mut buf)?;

    let (status, dives) = slice::decode(&buf, profile_len)?;

    Ok((status.info(), dives))
}
