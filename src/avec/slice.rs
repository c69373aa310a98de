//! Slice-based decoder implementation.

use alloc::vec::Vec;

use crate::sans::{
    deco,
    frame::{DiveRecordBytes, FrameError, Frames},
    header::{self, DiveHeader},
    sample,
    status::{self, StatusBlock, TruncatedDump},
};

use super::{DecodedDive, DiveError, SkippedDive};

/// Decode the status block and every dive of a dump.
///
/// `profile_len` is the size of the device's profile memory, see
/// [`PROFILE_LEN_MK1`](status::PROFILE_LEN_MK1) and
/// [`PROFILE_LEN_MK2`](status::PROFILE_LEN_MK2). Only a dump too short to
/// hold a status block fails as a whole.
///
/// This method is also re-exported as `ostc_dump::avec::decode_slice` and
/// `ostc_dump::decode_dump`.
pub fn decode(
    r: &[u8],
    profile_len: usize,
) -> Result<(StatusBlock<'_>, Vec<Result<DecodedDive, SkippedDive>>), TruncatedDump> {
    let status = status::decode(r, profile_len)?;

    let dives = Frames::new(status.profile)
        .map(|frame| match frame {
            Ok(record) => decode_record(&record),
            Err(FrameError::UnknownHeaderVersion { offset, version }) => Err(SkippedDive {
                offset,
                header: None,
                error: DiveError::UnknownHeaderVersion(version),
            }),
        })
        .collect();

    Ok((status, dives))
}

/// Decode a single framed dive record.
pub fn decode_record(record: &DiveRecordBytes<'_>) -> Result<DecodedDive, SkippedDive> {
    let header = header::decode(record.header).map_err(|err| SkippedDive {
        offset: record.offset,
        header: None,
        error: err.into(),
    })?;

    decode_dive(&header, record).map_err(|error| SkippedDive {
        offset: record.offset,
        header: Some(header),
        error,
    })
}

fn decode_dive(
    header: &DiveHeader,
    record: &DiveRecordBytes<'_>,
) -> Result<DecodedDive, DiveError> {
    let sample::SampleStream {
        mut samples,
        terminated,
        ..
    } = sample::decode(header, record.body)?;

    // The device records the time at the end of the dive.
    let start_time = header.start_time().ok_or(DiveError::InvalidTimestamp)?;

    deco::annotate(&mut samples);

    Ok(DecodedDive {
        offset: record.offset,
        start_time,
        max_depth: header.max_depth_m(),
        duration: header.duration(),
        min_temperature: header.min_temperature_c(),
        sampling: header.sampling,
        surface_pressure: header.surface_pressure,
        desaturation: header.desaturation,
        gases: header.gases,
        initial_gas: header.gas,
        samples,
        terminated,
    })
}
