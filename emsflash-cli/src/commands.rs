// CLI command handlers
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use emsflash_core::header::CartHeader;
use emsflash_core::resolve::AddressSpace;
use emsflash_core::transfer::{self, TransferRequest};
use emsflash_core::transport::CartTransport;
use emsflash_core::BANK_SIZE;
use indicatif::{ProgressBar, ProgressStyle};

pub fn read_cart<T>(cart: &mut T, file: &Path, request: &TransferRequest) -> Result<()>
where
    T: CartTransport + ?Sized,
{
    let out = File::create(file)
        .with_context(|| format!("Can't open {} for writing", file.display()))?;
    let mut sink = BufWriter::new(out);

    match request.space() {
        AddressSpace::Rom => log::debug!("Saving ROM into {}", file.display()),
        AddressSpace::Sram => log::debug!("Saving SAVE into {}", file.display()),
    }
    log::debug!("Base address is {:#x}", request.bank().base());

    let pb = create_progress_bar("Saving", u64::from(request.space().limit()));
    let written = transfer::read(cart, request, &mut sink, |progress| {
        pb.set_length(u64::from(progress.total_expected));
        pb.set_position(u64::from(progress.bytes_transferred));
    })?;
    pb.finish_and_clear();

    sink.flush()
        .with_context(|| format!("Can't write into {}", file.display()))?;

    println!("Successfully wrote {} bytes into {}", written, file.display());
    Ok(())
}

pub fn write_cart<T>(cart: &mut T, file: &Path, request: &TransferRequest) -> Result<()>
where
    T: CartTransport + ?Sized,
{
    let kind = match request.space() {
        AddressSpace::Rom => "ROM",
        AddressSpace::Sram => "SAVE",
    };
    let input =
        File::open(file).with_context(|| format!("Can't open {} file {}", kind, file.display()))?;
    let metadata = input
        .metadata()
        .with_context(|| format!("Can't read the size of {}", file.display()))?;
    let size = metadata.len().min(u64::from(u32::MAX)) as u32;
    let mut source = BufReader::new(input);

    log::debug!("Writing {} file {}", kind, file.display());
    log::debug!("Base address is {:#x}", request.bank().base());

    let pb = create_progress_bar("Writing", u64::from(size));
    let written = transfer::write(cart, request, &mut source, size, |progress| {
        pb.set_position(u64::from(progress.bytes_transferred));
    })?;
    pb.finish_and_clear();

    println!("Successfully wrote {} bytes from {}", written, file.display());
    Ok(())
}

pub fn print_titles<T>(cart: &mut T) -> Result<()>
where
    T: CartTransport + ?Sized,
{
    let mut buf = [0u8; 512];

    cart.read_block(AddressSpace::Rom, 0, &mut buf)
        .context("Couldn't read ROM header at bank 0, offset 0, len 512")?;
    println!("Bank 0: ");
    println!("{}", CartHeader::parse(&buf)?.report());

    println!();

    cart.read_block(AddressSpace::Rom, BANK_SIZE, &mut buf)
        .context("Couldn't read ROM header at bank 1, offset 0, len 512")?;
    println!("Bank 1: ");
    println!("{}", CartHeader::parse(&buf)?.report());

    Ok(())
}

fn create_progress_bar(message: &str, length: u64) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}: {percent:>3}% [{bar:40.green}] {bytes}/{total_bytes}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(message.to_string());
    pb
}
