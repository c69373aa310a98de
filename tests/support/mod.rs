//! Builders for synthetic dumps.

use ostc_dump::sans::{
    frame::{HEADER_END, HEADER_START, LONG_HEADER_LEN, SHORT_HEADER_LEN, TERMINATOR},
    status::PREAMBLE,
};

pub const SHORT: u8 = 0x20;
pub const LONG: u8 = 0x21;

/// Header fields varied by the tests. Everything else is fixed.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub version: u8,
    /// End of the dive: month, day, year after 2000, hour, minute.
    pub date: [u8; 5],
    pub max_depth: u16,
    pub duration: u16,
    pub sampling: u8,
    pub divisors: [u8; 5],
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: SHORT,
            date: [6, 15, 10, 10, 30],
            max_depth: 1500,
            duration: 60,
            sampling: 10,
            divisors: [0; 5],
        }
    }
}

impl Header {
    pub fn bytes(&self) -> Vec<u8> {
        let len = match self.version {
            LONG => LONG_HEADER_LEN,
            _ => SHORT_HEADER_LEN,
        };

        let mut h = vec![0; len];
        h[..2].copy_from_slice(&HEADER_START);
        h[2] = self.version;
        h[3..8].copy_from_slice(&self.date);
        h[8..10].copy_from_slice(&self.max_depth.to_le_bytes());
        h[10..12].copy_from_slice(&(self.duration / 60).to_le_bytes());
        h[12] = (self.duration % 60) as u8;
        h[13..15].copy_from_slice(&215u16.to_le_bytes());
        h[15..17].copy_from_slice(&1013u16.to_le_bytes());
        for gas in h[19..31].chunks_exact_mut(2) {
            gas.copy_from_slice(&[21, 0]);
        }
        h[31] = 1;
        h[32..34].copy_from_slice(&[1, 26]);
        h[34..36].copy_from_slice(&4000u16.to_le_bytes());
        h[36] = self.sampling;
        h[37..41].copy_from_slice(&self.divisors[..4]);
        if self.version == LONG {
            h[41] = self.divisors[4];
        }
        h[len - 2..].copy_from_slice(&HEADER_END);
        h
    }
}

/// A sample of `depth` centimeters with the given extra bytes.
pub fn sample(depth: u16, extra: &[u8]) -> Vec<u8> {
    let mut s = depth.to_le_bytes().to_vec();
    s.push(extra.len() as u8);
    s.extend_from_slice(extra);
    s
}

/// A complete dive record of `n` plain samples.
pub fn dive(header: Header, n: usize) -> Vec<u8> {
    record(header, (0..n).map(|_| sample(300, &[])))
}

/// A complete dive record from individual samples.
pub fn record(header: Header, samples: impl IntoIterator<Item = Vec<u8>>) -> Vec<u8> {
    let mut r = header.bytes();
    r.extend(samples.into_iter().flatten());
    r.extend_from_slice(&TERMINATOR);
    r
}

/// Profile memory written front to back, erased bytes reading `0xFF`.
pub struct Dump {
    profile: Vec<u8>,
    at: usize,
}

impl Dump {
    pub fn new(profile_len: usize) -> Self {
        Self {
            profile: vec![0xFF; profile_len],
            at: 0,
        }
    }

    /// Write bytes at the current position, returning their profile offset.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let offset = self.at;
        self.profile[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.at += bytes.len();
        offset
    }

    pub fn skip(&mut self, n: usize) {
        self.at += n;
    }

    /// Status block followed by the profile memory.
    pub fn build(&self) -> Vec<u8> {
        let mut r = PREAMBLE.to_vec();
        let mut settings = [0; 256];
        settings[..4].copy_from_slice(&[7, 0, 3, 0]);
        r.extend_from_slice(&settings);
        r.extend_from_slice(&3900u16.to_le_bytes());
        r.extend_from_slice(&[1, 91]);
        r.extend_from_slice(&self.profile);
        r
    }
}
