//! Game Boy cartridge header parsing and validation.
//!
//! The header window sits at the start of each ROM bank; every field
//! consumed here lives between offsets 0x104 and 0x14D. All accessors
//! are pure reads over a borrowed buffer captured once by
//! [`CartHeader::parse`], so re-running a check always yields the same
//! answer.

use std::borrow::Cow;
use std::fmt;

use crate::error::HeaderError;

// Header field offsets within a ROM bank.
pub const LOGO_OFFSET: usize = 0x104;
pub const TITLE_OFFSET: usize = 0x134;
pub const CGB_FLAG_OFFSET: usize = 0x143;
pub const SGB_FLAG_OFFSET: usize = 0x146;
pub const ROM_SIZE_OFFSET: usize = 0x148;
pub const CHECKSUM_OFFSET: usize = 0x14D;

/// Smallest buffer that contains every parsed field.
pub const MIN_HEADER_LEN: usize = 0x14E;

/// Maximum title length in bytes.
pub const TITLE_LEN: usize = 16;

/// Boot logo bitmap that licensed carts embed at offset 0x104.
pub const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B,
    0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D,
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E,
    0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99,
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC,
    0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

/// Outcome of comparing the embedded logo against [`NINTENDO_LOGO`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoCheck {
    /// All 48 bytes match.
    Pass,
    /// The first half matches; CGB boot ROMs only verify that half.
    FailCgbOnly,
    Fail,
}

impl fmt::Display for LogoCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogoCheck::Pass => write!(f, "PASS"),
            LogoCheck::FailCgbOnly => write!(f, "FAIL, but will boot on CGB"),
            LogoCheck::Fail => write!(f, "FAIL"),
        }
    }
}

/// Hardware classification derived from the CGB and SGB flag bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareSupport {
    Cgb,
    CgbSgb,
    DmgCgbSgb,
    DmgCgb,
    DmgSgb,
    Dmg,
}

impl fmt::Display for HardwareSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareSupport::Cgb => write!(f, "CGB"),
            HardwareSupport::CgbSgb => write!(f, "CGB <+SGB>, not real option set"),
            HardwareSupport::DmgCgbSgb => write!(f, "DMG <+CGB, +SGB>"),
            HardwareSupport::DmgCgb => write!(f, "DMG <+CGB>"),
            HardwareSupport::DmgSgb => write!(f, "DMG <+SGB>"),
            HardwareSupport::Dmg => write!(f, "DMG"),
        }
    }
}

/// Aggregate boot verdict. Ordered from best to worst so that the
/// overall verdict is the maximum of the individual findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootStatus {
    Anywhere,
    CgbOnly,
    WillNotBoot,
}

impl fmt::Display for BootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootStatus::Anywhere => write!(f, "This game will work on any system."),
            BootStatus::CgbOnly => write!(f, "This game will only boot on CGB."),
            BootStatus::WillNotBoot => write!(f, "This game will not boot on any system."),
        }
    }
}

/// Declared ROM size in bytes for a header size code, or `None` for an
/// unknown code.
///
/// Codes 0 through 7 double from 32 KB; the three 0x5x codes are the
/// odd multi-cart sizes.
pub fn declared_rom_size(code: u8) -> Option<u32> {
    match code {
        0..=7 => Some((32 * 1024) << code),
        0x52 => Some(1152 * 1024),
        0x53 => Some(1280 * 1024),
        0x54 => Some(1536 * 1024),
        _ => None,
    }
}

/// Read-only view over a captured header window.
///
/// The buffer must cover at least [`MIN_HEADER_LEN`] bytes from the
/// start of a ROM bank; [`CartHeader::parse`] enforces that once so the
/// accessors can index freely.
#[derive(Debug, Clone, Copy)]
pub struct CartHeader<'a> {
    data: &'a [u8],
}

impl<'a> CartHeader<'a> {
    /// Wraps a header buffer, rejecting buffers too short to hold the
    /// checksum byte.
    pub fn parse(data: &'a [u8]) -> Result<Self, HeaderError> {
        if data.len() < MIN_HEADER_LEN {
            return Err(HeaderError::TooShort {
                len: data.len(),
                min: MIN_HEADER_LEN,
            });
        }
        Ok(CartHeader { data })
    }

    /// Title bytes up to the first NUL, at most [`TITLE_LEN`] bytes.
    pub fn title_bytes(&self) -> &'a [u8] {
        let region = &self.data[TITLE_OFFSET..TITLE_OFFSET + TITLE_LEN];
        let end = region.iter().position(|b| *b == 0).unwrap_or(TITLE_LEN);
        &region[..end]
    }

    /// Title as text. Empty when the first title byte is NUL.
    pub fn title(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.title_bytes())
    }

    /// Compares the embedded logo against the reference bitmap.
    pub fn logo_check(&self) -> LogoCheck {
        let logo = &self.data[LOGO_OFFSET..LOGO_OFFSET + NINTENDO_LOGO.len()];
        let matched = logo
            .iter()
            .zip(NINTENDO_LOGO.iter())
            .take_while(|(a, b)| a == b)
            .count();
        if matched == NINTENDO_LOGO.len() {
            LogoCheck::Pass
        } else if matched >= NINTENDO_LOGO.len() / 2 {
            LogoCheck::FailCgbOnly
        } else {
            LogoCheck::Fail
        }
    }

    /// Classifies hardware support from the CGB and SGB flags.
    ///
    /// The rules are checked in order and the first match wins.
    pub fn hardware_support(&self) -> HardwareSupport {
        let cgb = self.data[CGB_FLAG_OFFSET];
        let sgb = self.data[SGB_FLAG_OFFSET];
        if cgb & 0x80 != 0 && cgb & 0x40 != 0 {
            HardwareSupport::Cgb
        } else if cgb & 0x80 != 0 && cgb & 0x40 != 0 && sgb == 0x03 {
            // Never taken: the branch above already matches both flag bits.
            HardwareSupport::CgbSgb
        } else if cgb & 0x80 != 0 && sgb == 0x03 {
            HardwareSupport::DmgCgbSgb
        } else if cgb & 0x80 != 0 {
            HardwareSupport::DmgCgb
        } else if sgb == 0x03 {
            HardwareSupport::DmgSgb
        } else {
            HardwareSupport::Dmg
        }
    }

    /// Header checksum over 0x134..=0x14D, offset by 25, must be zero.
    pub fn checksum_valid(&self) -> bool {
        let sum = self.data[TITLE_OFFSET..=CHECKSUM_OFFSET]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        sum.wrapping_add(25) == 0
    }

    /// Raw ROM size code byte.
    pub fn rom_size_code(&self) -> u8 {
        self.data[ROM_SIZE_OFFSET]
    }

    /// Declared ROM size in bytes, if the size code is known.
    pub fn declared_rom_size(&self) -> Option<u32> {
        declared_rom_size(self.rom_size_code())
    }

    /// Overall boot verdict, worst finding wins.
    pub fn boot_status(&self) -> BootStatus {
        let mut status = match self.logo_check() {
            LogoCheck::Pass => BootStatus::Anywhere,
            LogoCheck::FailCgbOnly => BootStatus::CgbOnly,
            LogoCheck::Fail => BootStatus::WillNotBoot,
        };
        if !self.checksum_valid() {
            // A bad checksum overrides a CGB-only demotion.
            status = status.max(BootStatus::WillNotBoot);
        }
        status
    }

    /// Runs every check once and captures the results.
    pub fn report(&self) -> HeaderReport {
        HeaderReport {
            title: self.title().into_owned(),
            logo: self.logo_check(),
            hardware: self.hardware_support(),
            checksum_ok: self.checksum_valid(),
            rom_size_code: self.rom_size_code(),
            boot: self.boot_status(),
        }
    }
}

/// Owned snapshot of one header's checks, printable as the report shown
/// by `--title`.
#[derive(Debug, Clone)]
pub struct HeaderReport {
    pub title: String,
    pub logo: LogoCheck,
    pub hardware: HardwareSupport,
    pub checksum_ok: bool,
    pub rom_size_code: u8,
    pub boot: BootStatus,
}

impl fmt::Display for HeaderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            writeln!(f, "\tTitle: NONE")?;
        } else {
            writeln!(f, "\tTitle: {}", self.title)?;
        }
        writeln!(f, "\tNintendo logo: {}", self.logo)?;
        writeln!(f, "\tHardware support: {}", self.hardware)?;
        let checksum = if self.checksum_ok { "PASS" } else { "FAIL" };
        writeln!(f, "\tHeader checksum: {}", checksum)?;
        match declared_rom_size(self.rom_size_code) {
            Some(bytes) => writeln!(f, "\tRom size: {} KB ROM", bytes / 1024)?,
            None => writeln!(f, "\tRom size: Unknown ROM size code")?,
        }
        write!(f, "\tBoot status: {}", self.boot)
    }
}
