//! Sequential reader over a borrowed byte slice.

use thiserror::Error;

/// An attempt to read past the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unexpectedly reached the end of the data.")]
pub struct OutOfData;

/// Reader tracking an offset into a borrowed slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    r: &'a [u8],
    i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(r: &'a [u8]) -> Self {
        Self { r, i: 0 }
    }

    /// Offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.i
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.r.len() - self.i
    }

    /// The unread bytes, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.r[self.i..]
    }

    /// Read the next `n` bytes, advancing the offset.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], OutOfData> {
        let end = self.i.checked_add(n).ok_or(OutOfData)?;
        let s = self.r.get(self.i..end).ok_or(OutOfData)?;
        self.i = end;

        Ok(s)
    }

    /// Take an exact number of bytes, advancing the offset.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], OutOfData> {
        let bytes = self.peek()?;
        self.i += N;

        Ok(bytes)
    }

    /// Copy an exact number of bytes without advancing the offset.
    pub fn peek<const N: usize>(&self) -> Result<[u8; N], OutOfData> {
        let end = self.i.checked_add(N).ok_or(OutOfData)?;
        let s = self.r.get(self.i..end).ok_or(OutOfData)?;

        s.try_into().map_err(|_| OutOfData)
    }
}
