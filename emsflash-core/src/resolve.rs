//! Address spaces, bank selection, and space auto-detection.

use std::fmt;
use std::path::Path;

use crate::error::ConfigError;
use crate::{BANK_SIZE, SRAM_SIZE};

/// Target memory region on the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpace {
    Rom,
    Sram,
}

impl AddressSpace {
    /// Maximum number of bytes addressable within one bank of this space.
    pub fn limit(self) -> u32 {
        match self {
            AddressSpace::Rom => BANK_SIZE,
            AddressSpace::Sram => SRAM_SIZE,
        }
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpace::Rom => write!(f, "ROM"),
            AddressSpace::Sram => write!(f, "SRAM"),
        }
    }
}

/// One of the two 32 Mbit ROM banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    One,
    Two,
}

impl Bank {
    /// Builds a bank from its user-facing number (1 or 2).
    pub fn from_number(number: u8) -> Result<Self, ConfigError> {
        match number {
            1 => Ok(Bank::One),
            2 => Ok(Bank::Two),
            other => Err(ConfigError::InvalidBank(other)),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Bank::One => 1,
            Bank::Two => 2,
        }
    }

    /// Absolute device offset at which this bank starts.
    pub fn base(self) -> u32 {
        match self {
            Bank::One => 0,
            Bank::Two => BANK_SIZE,
        }
    }
}

/// Resolves the address space for a transfer.
///
/// An explicit flag wins outright; supplying both is a configuration
/// error. Without a flag the last four bytes of the file name decide:
/// `.sav` (case-insensitive) selects SRAM, anything else ROM. Paths too
/// short to carry the suffix are rejected rather than inspected.
pub fn resolve_space(
    force_rom: bool,
    force_save: bool,
    path: &Path,
) -> Result<AddressSpace, ConfigError> {
    if force_rom && force_save {
        return Err(ConfigError::ConflictingSpace);
    }
    if force_rom {
        return Ok(AddressSpace::Rom);
    }
    if force_save {
        return Ok(AddressSpace::Sram);
    }

    let name = path.as_os_str().as_encoded_bytes();
    if name.len() < 4 {
        return Err(ConfigError::PathTooShort(path.display().to_string()));
    }
    if name[name.len() - 4..].eq_ignore_ascii_case(b".sav") {
        Ok(AddressSpace::Sram)
    } else {
        Ok(AddressSpace::Rom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_limits() {
        assert_eq!(AddressSpace::Rom.limit(), 4_194_304);
        assert_eq!(AddressSpace::Sram.limit(), 131_072);
    }

    #[test]
    fn test_bank_numbers_and_bases() {
        assert_eq!(Bank::from_number(1).unwrap(), Bank::One);
        assert_eq!(Bank::from_number(2).unwrap(), Bank::Two);
        assert_eq!(Bank::One.base(), 0);
        assert_eq!(Bank::Two.base(), BANK_SIZE);
        assert_eq!(Bank::Two.number(), 2);
        assert!(matches!(
            Bank::from_number(0),
            Err(ConfigError::InvalidBank(0))
        ));
        assert!(matches!(
            Bank::from_number(3),
            Err(ConfigError::InvalidBank(3))
        ));
    }

    #[test]
    fn test_explicit_flags_win() {
        let path = Path::new("game.sav");
        assert_eq!(
            resolve_space(true, false, path).unwrap(),
            AddressSpace::Rom
        );
        let path = Path::new("game.gb");
        assert_eq!(
            resolve_space(false, true, path).unwrap(),
            AddressSpace::Sram
        );
    }

    #[test]
    fn test_both_flags_conflict() {
        let result = resolve_space(true, true, Path::new("game.gb"));
        assert!(matches!(result, Err(ConfigError::ConflictingSpace)));
    }

    #[test]
    fn test_sav_suffix_detection() {
        assert_eq!(
            resolve_space(false, false, Path::new("pokemon.sav")).unwrap(),
            AddressSpace::Sram
        );
        assert_eq!(
            resolve_space(false, false, Path::new("POKEMON.SAV")).unwrap(),
            AddressSpace::Sram
        );
        assert_eq!(
            resolve_space(false, false, Path::new("mixed.SaV")).unwrap(),
            AddressSpace::Sram
        );
        assert_eq!(
            resolve_space(false, false, Path::new(".sav")).unwrap(),
            AddressSpace::Sram
        );
    }

    #[test]
    fn test_other_suffixes_are_rom() {
        assert_eq!(
            resolve_space(false, false, Path::new("tetris.gb")).unwrap(),
            AddressSpace::Rom
        );
        assert_eq!(
            resolve_space(false, false, Path::new("backup.sav.bak")).unwrap(),
            AddressSpace::Rom
        );
        assert_eq!(
            resolve_space(false, false, Path::new("nosuffix")).unwrap(),
            AddressSpace::Rom
        );
    }

    #[test]
    fn test_short_paths_rejected() {
        let result = resolve_space(false, false, Path::new("abc"));
        assert!(matches!(result, Err(ConfigError::PathTooShort(_))));
    }
}
