//! Transfer engine for the EMS 64 Mbit USB Game Boy flash cart.
//!
//! Maps a logical operation (read or write, bank 1 or 2, ROM or SRAM)
//! onto block transfers at the right device offsets, and parses the
//! cartridge header to validate dumps and to stop a ROM read at the
//! game's declared size.

pub mod error;
pub mod header;
pub mod resolve;
pub mod transfer;
pub mod transport;

/// One bank is 32 megabits.
pub const BANK_SIZE: u32 = 0x40_0000;

/// Size of the save RAM region in bytes.
pub const SRAM_SIZE: u32 = 0x2_0000;
