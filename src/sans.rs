//! Individual stages of the dump decoder.
//!
//! This module is intended for applications that need to drive decoding
//! themselves, for example to decode dives framed elsewhere or to inspect a
//! dive rejected by the convenience decoders. See [`crate::avec`] for
//! implementations covering a whole dump.
//!
//! # Architecture
//!
//! A dump is decoded leaf-first by the following stages, each borrowing
//! the dump read-only:
//!
//! 1. [`status`] splits the fixed status block from the profile blob.
//!
//! 2. [`frame`] scans the profile blob for dive records, delimited by the
//! header start (`FA FA`), header end (`FB FB`) and body terminator
//! (`FD FD`) markers. The header length depends on its version byte.
//!
//! 3. [`header`] decodes the fixed layout of a dive header, including the
//! divisor bytes controlling which optional fields each sample carries.
//!
//! 4. [`sample`] walks the variable-length sample body, checking that
//! every sample accounts for exactly the bytes its flag byte announces.
//!
//! 5. [`deco`] marks contiguous decompression periods over the decoded
//! samples.
//!
//! All stages read through a [`cursor::Cursor`]. Failures in stages 2-5
//! are scoped to a single dive; only a dump too short to hold a status
//! block is fatal.

pub mod cursor;
pub mod deco;
pub mod frame;
pub mod header;
pub mod sample;
pub mod status;
