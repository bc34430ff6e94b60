//! Block transfer orchestration.
//!
//! A transfer moves whole blocks between the cart and a local stream.
//! Both directions share the same loop shape: while one more full block
//! fits under the space limit, move it and advance. Chunks shorter than
//! one block are never transferred, on either side. ROM reads shorten
//! themselves once the cart's self-reported size is known, so dumping a
//! 32 KB game does not pull a whole 4 MiB bank.

use std::io::{self, Read, Write};

use crate::error::{ConfigError, TransferError};
use crate::header;
use crate::resolve::{AddressSpace, Bank};
use crate::transport::CartTransport;

/// Immutable description of one transfer, validated at construction.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest {
    space: AddressSpace,
    bank: Bank,
    block_size: u32,
}

impl TransferRequest {
    pub fn new(space: AddressSpace, bank: Bank, block_size: u32) -> Result<Self, ConfigError> {
        if block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        Ok(TransferRequest {
            space,
            bank,
            block_size,
        })
    }

    pub fn space(&self) -> AddressSpace {
        self.space
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }
}

/// Progress snapshot emitted after every completed block.
///
/// `total_expected` can shrink mid-read when a ROM dump learns the
/// declared size from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_transferred: u32,
    pub total_expected: u32,
}

/// Reads from the cart into `sink`, one block at a time.
///
/// The read stops before the block that would cross the space limit.
/// For ROM space, the block that covers the header's size code is
/// decoded in place and a known code lowers the limit to the declared
/// size; the code is consulted at most once per run. Returns the number
/// of bytes written to `sink`.
pub fn read<T, W, F>(
    cart: &mut T,
    request: &TransferRequest,
    sink: &mut W,
    mut on_progress: F,
) -> Result<u32, TransferError>
where
    T: CartTransport + ?Sized,
    W: Write,
    F: FnMut(TransferProgress),
{
    let block_size = request.block_size();
    let base = request.bank().base();
    let mut limit = request.space().limit();
    let mut buf = vec![0u8; block_size as usize];
    let mut offset: u32 = 0;
    let mut size_known = false;

    while u64::from(offset) + u64::from(block_size) <= u64::from(limit) {
        cart.read_block(request.space(), base + offset, &mut buf)
            .map_err(|source| TransferError::DeviceRead {
                offset,
                len: block_size,
                source,
            })?;
        sink.write_all(&buf).map_err(|source| TransferError::Sink {
            offset,
            len: block_size,
            source,
        })?;

        let block_start = offset;
        offset += block_size;
        on_progress(TransferProgress {
            bytes_transferred: offset,
            total_expected: limit,
        });

        if request.space() == AddressSpace::Rom && !size_known {
            let size_byte = header::ROM_SIZE_OFFSET as u32;
            if block_start <= size_byte && size_byte < offset {
                let code = buf[(size_byte - block_start) as usize];
                match header::declared_rom_size(code) {
                    Some(declared) => limit = limit.min(declared),
                    None => log::debug!(
                        "Unknown ROM size code {:#04x}, reading the full bank",
                        code
                    ),
                }
                size_known = true;
            }
        }
    }

    Ok(offset)
}

/// Writes `source` to the cart, one block at a time.
///
/// Sources larger than the space limit are rejected before any device
/// traffic. The write stops at the space limit or at the last full
/// block the source can supply, whichever comes first. Returns the
/// number of bytes written to the cart.
pub fn write<T, R, F>(
    cart: &mut T,
    request: &TransferRequest,
    source: &mut R,
    source_size: u32,
    mut on_progress: F,
) -> Result<u32, TransferError>
where
    T: CartTransport + ?Sized,
    R: Read,
    F: FnMut(TransferProgress),
{
    let limit = request.space().limit();
    if source_size > limit {
        return Err(TransferError::SourceTooLarge {
            space: request.space(),
            size: source_size,
            limit,
        });
    }

    let block_size = request.block_size();
    let base = request.bank().base();
    let mut buf = vec![0u8; block_size as usize];
    let mut offset: u32 = 0;

    while u64::from(offset) + u64::from(block_size) <= u64::from(limit) {
        let full = fill_block(source, &mut buf).map_err(|source| TransferError::Source {
            offset,
            len: block_size,
            source,
        })?;
        if !full {
            break;
        }
        cart.write_block(request.space(), base + offset, &buf)
            .map_err(|source| TransferError::DeviceWrite {
                offset,
                len: block_size,
                source,
            })?;

        offset += block_size;
        on_progress(TransferProgress {
            bytes_transferred: offset,
            total_expected: source_size,
        });
    }

    Ok(offset)
}

/// Reads one full block from `source`. `Ok(false)` means the source ran
/// out first; whatever partial data was read is dropped.
fn fill_block<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_block_size_rejected() {
        let result = TransferRequest::new(AddressSpace::Rom, Bank::One, 0);
        assert!(matches!(result, Err(ConfigError::ZeroBlockSize)));
    }

    #[test]
    fn test_request_accessors() {
        let request = TransferRequest::new(AddressSpace::Sram, Bank::Two, 32).unwrap();
        assert_eq!(request.space(), AddressSpace::Sram);
        assert_eq!(request.bank(), Bank::Two);
        assert_eq!(request.block_size(), 32);
    }

    #[test]
    fn test_fill_block_drops_partial_tail() {
        let data = [7u8; 10];
        let mut source: &[u8] = &data;
        let mut buf = [0u8; 4];
        assert!(fill_block(&mut source, &mut buf).unwrap());
        assert!(fill_block(&mut source, &mut buf).unwrap());
        // Two bytes remain, less than one block.
        assert!(!fill_block(&mut source, &mut buf).unwrap());
    }
}
