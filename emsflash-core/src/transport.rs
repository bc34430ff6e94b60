//! Cart transport contract and backends.

pub mod emulated;

use crate::error::TransportError;
use crate::resolve::AddressSpace;

/// Block-granular access to an attached cart.
///
/// Offsets are absolute within the selected space; callers validate
/// them against the space limits before issuing a transfer. The
/// underlying protocol is not re-entrant, so a transport is driven by
/// exactly one operation at a time.
pub trait CartTransport {
    /// Fills `buf` from the cart starting at `offset`.
    fn read_block(
        &mut self,
        space: AddressSpace,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), TransportError>;

    /// Writes `data` to the cart starting at `offset`.
    fn write_block(
        &mut self,
        space: AddressSpace,
        offset: u32,
        data: &[u8],
    ) -> Result<(), TransportError>;
}
