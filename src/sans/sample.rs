//! Variable-length sample body of a dive.
//!
//! Every sample opens with its depth and a profile flag byte. The flag byte
//! announces how many further bytes belong to the sample, and whether the
//! first of these is an event byte. The remaining bytes hold the optional
//! fields scheduled by the header's divisor bytes: a field with period `n`
//! is present on every `n`th sample, counting from one.

use alloc::vec::Vec;

use tartan_bitfield::bitfield;
use thiserror::Error;
use tinyvec::ArrayVec;

use super::{
    cursor::{Cursor, OutOfData},
    frame::TERMINATOR,
    header::{Channel, DiveHeader, GasMix, divisor},
};

/// Deco time reported while no decompression stop is required.
pub const NO_DECO_TIME: u8 = 160;

/// An error decoding a sample body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SampleError {
    /// A sample did not consume the number of bytes its flag byte announced.
    #[error("Sample {sample} announced {expected} extra bytes, but consumed {consumed}.")]
    InvalidDive {
        sample: u32,
        expected: u8,
        consumed: usize,
    },
    /// A sample extends past the end of the body.
    #[error(transparent)]
    OutOfData(#[from] OutOfData),
}

/// Opaque field payload, at most 15 bytes wide.
pub type Payload = ArrayVec<[u8; 15]>;

/// A single decoded sample.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DiveSample {
    /// Depth in meters.
    pub depth: f32,
    /// Alarm code raised by the device, if any.
    pub alarm: Option<u8>,
    /// Whether the sample falls within a decompression period.
    pub deco_alarm: bool,
    /// Gas mix set manually during the dive.
    pub gas_set: Option<GasMix>,
    /// Index of the gas switched to.
    pub current_gas: Option<u8>,
    /// Temperature in degrees.
    pub temperature: Option<f32>,
    /// Depth of the current decompression stop in meters.
    pub deco_depth: Option<u8>,
    /// Decompression stop time in minutes, or no-stop time.
    pub deco_time: Option<u8>,
    pub tank: Option<Payload>,
    pub ppo2: Option<Payload>,
    pub deco_debug: Option<Payload>,
}

/// Decoded samples of a dive body.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStream {
    /// Samples within the nominal dive duration.
    pub samples: Vec<DiveSample>,
    /// Number of samples stored in the body.
    pub recorded: usize,
    /// Whether the body ends with the terminator marker.
    pub terminated: bool,
}

/// Split a profile flag byte into the number of extra bytes and the
/// presence of an event byte.
pub fn flag_byte(value: u8) -> (u8, bool) {
    bitfield! {
        struct ProfileFlag(u8) {
            [0..7] extra: u8,
            [7] has_event,
        }
    }

    let flag = ProfileFlag(value);
    (flag.extra(), flag.has_event())
}

/// Decode the samples of a dive body, including its terminator.
///
/// Samples recorded after the nominal dive duration are walked but not
/// returned.
pub fn decode(header: &DiveHeader, body: &[u8]) -> Result<SampleStream, SampleError> {
    let (data, terminator) = body.split_at(body.len().saturating_sub(TERMINATOR.len()));

    let duration = header.duration();
    let sampling = u32::from(header.sampling);

    let mut c = Cursor::new(data);
    let mut samples = Vec::new();
    let mut index = 1;

    while c.remaining() > 0 {
        let sample = decode_sample(&mut c, index, &header.divisors)?;

        if sampling.saturating_mul(index - 1) <= duration {
            samples.push(sample);
        }

        index += 1;
    }

    Ok(SampleStream {
        samples,
        recorded: (index - 1) as usize,
        terminated: terminator == TERMINATOR,
    })
}

fn decode_sample(
    c: &mut Cursor,
    index: u32,
    divisors: &[u8; 5],
) -> Result<DiveSample, SampleError> {
    let depth = u16::from_le_bytes(c.take()?);
    let (expected, has_event) = flag_byte(c.take::<1>()?[0]);

    let start = c.offset(); // Extra bytes are counted from here.

    let mut sample = DiveSample {
        depth: f32::from(depth) / 100.0,
        ..Default::default()
    };

    if has_event {
        bitfield! {
            struct Event(u8) {
                [0..4] alarm: u8,
                [4] gas_set,
                [5] gas_change,
            }
        }

        let event = Event(c.take::<1>()?[0]);

        sample.alarm = Some(event.alarm()).filter(|&a| a != 0);

        if event.gas_set() {
            let [o2, he] = c.take::<2>()?;
            sample.gas_set = Some(GasMix { o2, he });
        }

        if event.gas_change() {
            sample.current_gas = Some(c.take::<1>()?[0]);
        }
    }

    for (channel, &value) in Channel::ALL.iter().zip(divisors) {
        let (period, width) = divisor(value);
        if period == 0 || index % u32::from(period) != 0 {
            continue;
        }

        let r = c.read(usize::from(width))?;

        match channel {
            Channel::Temperature => {
                if let [a, b, ..] = *r {
                    sample.temperature = Some(f32::from(u16::from_le_bytes([a, b])) / 10.0);
                }
            }
            Channel::Deco => {
                if let [depth, time, ..] = *r {
                    sample.deco_depth = Some(depth);
                    sample.deco_time = Some(time);
                }
            }
            Channel::Tank => sample.tank = Some(payload(r)),
            Channel::Ppo2 => sample.ppo2 = Some(payload(r)),
            Channel::DecoDebug => sample.deco_debug = Some(payload(r)),
        }
    }

    let consumed = c.offset() - start;
    if consumed != usize::from(expected) {
        Err(SampleError::InvalidDive {
            sample: index,
            expected,
            consumed,
        })?;
    }

    Ok(sample)
}

fn payload(r: &[u8]) -> Payload {
    r.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn header(sampling: u8, duration: u16, divisors: [u8; 5]) -> DiveHeader {
        DiveHeader {
            version: 0x20,
            month: 1,
            day: 1,
            year: 10,
            hour: 12,
            minute: 0,
            max_depth: 1000,
            dive_time_m: duration / 60,
            dive_time_s: (duration % 60) as u8,
            min_temperature: 200,
            surface_pressure: 1013,
            desaturation: 0,
            gases: [GasMix { o2: 21, he: 0 }; 6],
            gas: 1,
            firmware: (1, 26),
            voltage: 4000,
            sampling,
            divisors,
        }
    }

    #[test]
    fn flag_byte_split() {
        assert_eq!(flag_byte(132), (4, true));
        assert_eq!(flag_byte(5), (5, false));
        assert_eq!(flag_byte(0), (0, false));
    }

    #[test]
    fn decodes_scheduled_fields() {
        // Temperature and deco every 2nd sample, tank never.
        let h = header(10, 600, [0x22, 0x22, 0x30, 0x00, 0x00]);

        let body = vec![
            0x2C, 0x01, 0x00, // 3.00 m
            0x5E, 0x01, 0x04, 0x32, 0x00, 0x00, 0xA0, // 3.50 m, 5.0 degrees, no stop
            0xF4, 0x01, 0x83, 0x15, 0x0F, 0x00, // 5.00 m, alarm 5, gas set to 15/0
            0xFD, 0xFD,
        ];

        let stream = decode(&h, &body).unwrap();
        assert_eq!(stream.recorded, 3);
        assert!(stream.terminated);

        let [a, b, c] = &stream.samples[..] else {
            panic!("expected three samples");
        };

        assert_eq!(a.depth, 3.0);
        assert_eq!(a.temperature, None);

        assert_eq!(b.depth, 3.5);
        assert_eq!(b.temperature, Some(5.0));
        assert_eq!((b.deco_depth, b.deco_time), (Some(0), Some(NO_DECO_TIME)));
        assert_eq!(b.tank, None);

        assert_eq!(c.alarm, Some(5));
        assert_eq!(c.gas_set, Some(GasMix { o2: 15, he: 0 }));
        assert_eq!(c.current_gas, None);
    }

    #[test]
    fn event_with_gas_change() {
        let h = header(10, 600, [0; 5]);
        let body = vec![0x2C, 0x01, 0x82, 0x20, 0x02, 0xFD, 0xFD];

        let stream = decode(&h, &body).unwrap();
        assert_eq!(stream.samples[0].alarm, None);
        assert_eq!(stream.samples[0].current_gas, Some(2));
    }

    #[test]
    fn opaque_payloads() {
        let h = header(10, 600, [0x00, 0x00, 0x21, 0x11, 0x31]);
        let body = vec![0x2C, 0x01, 0x06, 0x10, 0x20, 0x30, 0x01, 0x02, 0x03, 0xFD, 0xFD];

        let stream = decode(&h, &body).unwrap();
        let sample = &stream.samples[0];
        assert_eq!(sample.tank.as_deref(), Some(&[0x10u8, 0x20][..]));
        assert_eq!(sample.ppo2.as_deref(), Some(&[0x30u8][..]));
        assert_eq!(sample.deco_debug.as_deref(), Some(&[0x01u8, 0x02, 0x03][..]));
    }

    #[test]
    fn inconsistent_sample_is_invalid() {
        let h = header(10, 600, [0x22, 0x00, 0x00, 0x00, 0x00]);

        // The second sample carries temperature, but announces one byte.
        let body = vec![0x2C, 0x01, 0x00, 0x2C, 0x01, 0x01, 0x32, 0x00, 0xFD, 0xFD];

        assert_eq!(
            decode(&h, &body),
            Err(SampleError::InvalidDive {
                sample: 2,
                expected: 1,
                consumed: 2
            })
        );
    }

    #[test]
    fn truncated_sample_is_out_of_data() {
        let h = header(10, 600, [0x21, 0x00, 0x00, 0x00, 0x00]);
        let body = vec![0x2C, 0x01, 0x02, 0x32, 0xFD, 0xFD];

        assert_eq!(decode(&h, &body), Err(SampleError::OutOfData(OutOfData)));
    }

    #[test]
    fn samples_after_duration_are_dropped() {
        // 25 seconds at 10 second sampling covers samples 1 to 3.
        let h = header(10, 25, [0; 5]);

        let mut body = vec![];
        for _ in 0..5 {
            body.extend([0x2C, 0x01, 0x00]);
        }
        body.extend([0xFD, 0xFD]);

        let stream = decode(&h, &body).unwrap();
        assert_eq!(stream.recorded, 5);
        assert_eq!(stream.samples.len(), 3);
    }

    #[test]
    fn missing_terminator_is_flagged() {
        let h = header(10, 600, [0; 5]);
        let body = vec![0x2C, 0x01, 0x00, 0x00, 0x00];

        let stream = decode(&h, &body).unwrap();
        assert_eq!(stream.recorded, 1);
        assert!(!stream.terminated);
    }
}
