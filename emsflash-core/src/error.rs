//! Error types for the transfer engine.
//!
//! One enum per failure class: configuration problems caught before any
//! device traffic, transport faults from the cart itself, transfer-loop
//! failures, and malformed header buffers.

use std::io;

use thiserror::Error;

use crate::resolve::AddressSpace;

/// Configuration errors.
///
/// Detected while resolving flags into a transfer request, before the
/// cart or any file is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("must supply zero or one of --save, or --rom")]
    ConflictingSpace,

    #[error("cart only has two banks: 1 and 2")]
    InvalidBank(u8),

    #[error("block size must be > 0")]
    ZeroBlockSize,

    /// Paths shorter than the `.sav` suffix cannot be auto-detected.
    #[error("file name {0:?} is too short to infer a target, use --rom or --save")]
    PathTooShort(String),
}

/// Faults raised by a cart transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Could not find an EMS cart")]
    NotFound,

    /// The requested range does not fit the addressed region.
    #[error("Transfer out of range: {len} bytes at offset {offset:#x} in {space} space")]
    OutOfRange {
        space: AddressSpace,
        offset: u32,
        len: usize,
    },

    #[error("Cart image I/O error")]
    Io(#[from] io::Error),
}

/// Failures during a block transfer run.
///
/// Device-side variants carry the bank-relative offset at which the run
/// stopped, which equals the number of bytes moved before the fault.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Can't read {len} bytes at offset {offset}")]
    DeviceRead {
        offset: u32,
        len: u32,
        #[source]
        source: TransportError,
    },

    #[error("Can't write {len} bytes at offset {offset}")]
    DeviceWrite {
        offset: u32,
        len: u32,
        #[source]
        source: TransportError,
    },

    /// Rejected before the first device call.
    #[error("{space} source is {size} bytes large, max is {limit}")]
    SourceTooLarge {
        space: AddressSpace,
        size: u32,
        limit: u32,
    },

    #[error("Can't write {len} bytes into file at offset {offset}")]
    Sink {
        offset: u32,
        len: u32,
        #[source]
        source: io::Error,
    },

    #[error("Can't read {len} bytes from file at offset {offset}")]
    Source {
        offset: u32,
        len: u32,
        #[source]
        source: io::Error,
    },
}

/// Malformed header buffers.
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("Cart header too short: got {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },
}
