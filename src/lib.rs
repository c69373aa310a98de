#![no_std]

//! A decoder for memory dumps of OSTC dive computers.
//!
//! A dump is the raw image returned by the device's download command: a
//! fixed status block (device settings, battery voltage, firmware version)
//! followed by a circular profile buffer holding the recorded dives. This
//! crate turns such a dump into a sequence of decoded dives, each with its
//! header metadata and depth/temperature/event samples. A single corrupted
//! dive is reported on its own and never prevents recovering the others.
//!
//! Most users should begin with [`decode_dump`] (or the functions in the
//! [`avec`] module). The individual decoding stages live in [`sans`] for
//! applications that need to drive them directly.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoder (default).
//! - `serde`: derive `Serialize` for decoded dives and device information.
//! - `cli`: build the `ostc-decode` command-line tool.

extern crate alloc;

pub mod avec;
pub mod sans;

pub use avec::slice::decode as decode_dump;
