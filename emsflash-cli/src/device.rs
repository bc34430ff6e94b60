// Cart device discovery
use std::env;

use emsflash_core::error::TransportError;
use emsflash_core::transport::emulated::EmulatedCart;

/// Environment variable naming the cart image directory.
pub const CART_ENV: &str = "EMSFLASH_CART";

/// Claims the attached cart.
///
/// Cart images are directories holding `rom.bin` and `sram.bin`;
/// `EMSFLASH_CART` points at the one to use. With the variable unset
/// there is no cart to claim.
pub fn open() -> Result<EmulatedCart, TransportError> {
    match env::var_os(CART_ENV) {
        Some(dir) => EmulatedCart::open(dir),
        None => Err(TransportError::NotFound),
    }
}
