//! In-memory cart backend with optional disk backing.
//!
//! Stands in for a physical EMS cart: two contiguous ROM banks of
//! erased flash and one SRAM region, optionally persisted as `rom.bin`
//! and `sram.bin` inside an image directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::TransportError;
use crate::resolve::AddressSpace;
use crate::transport::CartTransport;
use crate::{BANK_SIZE, SRAM_SIZE};

const ROM_IMAGE: &str = "rom.bin";
const SRAM_IMAGE: &str = "sram.bin";

/// Emulated EMS cart.
///
/// ROM reads back as 0xFF where never written, like erased flash. The
/// cart has a single physical SRAM, so SRAM addressing decodes only the
/// low bits and both banks see the same save data.
pub struct EmulatedCart {
    rom: Vec<u8>,
    sram: Vec<u8>,
    backing: Option<PathBuf>,
    dirty: bool,
}

impl EmulatedCart {
    /// Blank cart with no disk backing.
    pub fn new() -> Self {
        EmulatedCart {
            rom: vec![0xFF; 2 * BANK_SIZE as usize],
            sram: vec![0x00; SRAM_SIZE as usize],
            backing: None,
            dirty: false,
        }
    }

    /// Opens a cart image directory, creating it if missing.
    ///
    /// Absent image files leave the matching region blank; short files
    /// fill the region from the start.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self, TransportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let mut cart = EmulatedCart::new();
        load_region(&dir.join(ROM_IMAGE), &mut cart.rom)?;
        load_region(&dir.join(SRAM_IMAGE), &mut cart.sram)?;
        cart.backing = Some(dir);
        Ok(cart)
    }

    /// Persists both regions to the image directory, if any.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = &self.backing {
            fs::write(dir.join(ROM_IMAGE), &self.rom)?;
            fs::write(dir.join(SRAM_IMAGE), &self.sram)?;
        }
        self.dirty = false;
        Ok(())
    }

    fn region(&mut self, space: AddressSpace) -> &mut [u8] {
        match space {
            AddressSpace::Rom => &mut self.rom,
            AddressSpace::Sram => &mut self.sram,
        }
    }

    fn range(
        &mut self,
        space: AddressSpace,
        offset: u32,
        len: usize,
    ) -> Result<&mut [u8], TransportError> {
        let offset = match space {
            AddressSpace::Rom => offset,
            // Only the low address bits reach the SRAM chip.
            AddressSpace::Sram => offset & (SRAM_SIZE - 1),
        };
        let region = self.region(space);
        let start = offset as usize;
        let end = start.checked_add(len).filter(|end| *end <= region.len());
        match end {
            Some(end) => Ok(&mut region[start..end]),
            None => Err(TransportError::OutOfRange { space, offset, len }),
        }
    }
}

impl Default for EmulatedCart {
    fn default() -> Self {
        EmulatedCart::new()
    }
}

impl CartTransport for EmulatedCart {
    fn read_block(
        &mut self,
        space: AddressSpace,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        let src = self.range(space, offset, buf.len())?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_block(
        &mut self,
        space: AddressSpace,
        offset: u32,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let dst = self.range(space, offset, data.len())?;
        dst.copy_from_slice(data);
        self.dirty = true;
        Ok(())
    }
}

impl Drop for EmulatedCart {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Failed to flush cart image: {}", e);
        }
    }
}

fn load_region(path: &Path, region: &mut [u8]) -> io::Result<()> {
    match fs::read(path) {
        Ok(data) => {
            let n = data.len().min(region.len());
            region[..n].copy_from_slice(&data[..n]);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "emsflash-cart-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_blank_cart_contents() {
        let mut cart = EmulatedCart::new();
        let mut buf = [0u8; 16];
        cart.read_block(AddressSpace::Rom, 0, &mut buf).unwrap();
        assert!(buf.iter().all(|b| *b == 0xFF));
        cart.read_block(AddressSpace::Rom, BANK_SIZE, &mut buf).unwrap();
        assert!(buf.iter().all(|b| *b == 0xFF));
        cart.read_block(AddressSpace::Sram, 0, &mut buf).unwrap();
        assert!(buf.iter().all(|b| *b == 0x00));
    }

    #[test]
    fn test_write_then_read() {
        let mut cart = EmulatedCart::new();
        let data = [0xAB; 32];
        cart.write_block(AddressSpace::Rom, 0x1000, &data).unwrap();
        let mut buf = [0u8; 32];
        cart.read_block(AddressSpace::Rom, 0x1000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_sram_mirrors_across_banks() {
        let mut cart = EmulatedCart::new();
        let data = [0x5A; 8];
        cart.write_block(AddressSpace::Sram, 0x40, &data).unwrap();
        let mut buf = [0u8; 8];
        cart.read_block(AddressSpace::Sram, BANK_SIZE + 0x40, &mut buf)
            .unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut cart = EmulatedCart::new();
        let mut buf = [0u8; 16];
        let result = cart.read_block(AddressSpace::Rom, 2 * BANK_SIZE, &mut buf);
        assert!(matches!(result, Err(TransportError::OutOfRange { .. })));
        let result = cart.read_block(AddressSpace::Rom, 2 * BANK_SIZE - 8, &mut buf);
        assert!(matches!(result, Err(TransportError::OutOfRange { .. })));
    }

    #[test]
    fn test_flush_persists_image() {
        let dir = image_dir("flush");
        {
            let mut cart = EmulatedCart::open(&dir).unwrap();
            cart.write_block(AddressSpace::Rom, 0, &[1, 2, 3, 4]).unwrap();
            cart.write_block(AddressSpace::Sram, 0, &[9, 9]).unwrap();
            cart.flush().unwrap();
        }
        let mut cart = EmulatedCart::open(&dir).unwrap();
        let mut buf = [0u8; 4];
        cart.read_block(AddressSpace::Rom, 0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        let mut buf = [0u8; 2];
        cart.read_block(AddressSpace::Sram, 0, &mut buf).unwrap();
        assert_eq!(buf, [9, 9]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_drop_persists_image() {
        let dir = image_dir("drop");
        {
            let mut cart = EmulatedCart::open(&dir).unwrap();
            cart.write_block(AddressSpace::Rom, 8, &[0xEE; 4]).unwrap();
        }
        let mut cart = EmulatedCart::open(&dir).unwrap();
        let mut buf = [0u8; 4];
        cart.read_block(AddressSpace::Rom, 8, &mut buf).unwrap();
        assert_eq!(buf, [0xEE; 4]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_short_image_file_pads_with_erased_flash() {
        let dir = image_dir("short");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ROM_IMAGE), [0x11u8; 8]).unwrap();
        let mut cart = EmulatedCart::open(&dir).unwrap();
        let mut buf = [0u8; 16];
        cart.read_block(AddressSpace::Rom, 0, &mut buf).unwrap();
        assert_eq!(&buf[..8], &[0x11; 8]);
        assert!(buf[8..].iter().all(|b| *b == 0xFF));
        fs::remove_dir_all(&dir).unwrap();
    }
}
