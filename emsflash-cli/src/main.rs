// CLI application
use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use std::path::PathBuf;

use emsflash_core::error::ConfigError;
use emsflash_core::resolve::{self, Bank};
use emsflash_core::transfer::TransferRequest;

mod commands;
mod device;

// Default blocksizes.
const BLOCKSIZE_READ: u32 = 4096;
const BLOCKSIZE_WRITE: u32 = 32;

#[derive(Parser)]
#[command(name = "emsflash")]
#[command(about = "Writes a ROM or SAV file to the EMS 64 Mbit USB flash cart")]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true)))]
struct Cli {
    /// Read entire cart into file
    #[arg(long, value_name = "FILE", group = "mode")]
    read: Option<PathBuf>,

    /// Write ROM file to cart
    #[arg(long, value_name = "FILE", group = "mode")]
    write: Option<PathBuf>,

    /// Print the title of the ROM in both banks
    #[arg(long, group = "mode")]
    title: bool,

    /// Select cart bank (1 or 2)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    bank: u8,

    /// Force transfer to/from SRAM
    #[arg(long, group = "space")]
    save: bool,

    /// Force transfer to/from Flash ROM
    #[arg(long, group = "space")]
    rom: bool,

    /// Bytes per block (default: 4096 read, 32 write)
    #[arg(long, value_name = "SIZE", value_parser = clap::value_parser!(u32).range(1..))]
    blocksize: Option<u32>,

    /// Log transfer details
    #[arg(short, long)]
    verbose: bool,
}

enum Operation {
    Read {
        file: PathBuf,
        request: TransferRequest,
    },
    Write {
        file: PathBuf,
        request: TransferRequest,
    },
    Title,
}

fn resolve_operation(cli: &Cli) -> Result<Operation, ConfigError> {
    let bank = Bank::from_number(cli.bank)?;
    if let Some(file) = &cli.read {
        let space = resolve::resolve_space(cli.rom, cli.save, file)?;
        let request = TransferRequest::new(space, bank, cli.blocksize.unwrap_or(BLOCKSIZE_READ))?;
        Ok(Operation::Read {
            file: file.clone(),
            request,
        })
    } else if let Some(file) = &cli.write {
        let space = resolve::resolve_space(cli.rom, cli.save, file)?;
        let request = TransferRequest::new(space, bank, cli.blocksize.unwrap_or(BLOCKSIZE_WRITE))?;
        Ok(Operation::Write {
            file: file.clone(),
            request,
        })
    } else {
        Ok(Operation::Title)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage problems exit with 1 rather than clap's default 2.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Configuration problems get the usage text, like parse errors do.
    let operation = match resolve_operation(&cli) {
        Ok(operation) => operation,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!();
            eprintln!("{}", Cli::command().render_usage());
            std::process::exit(1);
        }
    };

    log::debug!("Trying to find EMS cart");
    let mut cart = device::open().with_context(|| {
        format!(
            "Could not claim an EMS cart (set {} to a cart image directory)",
            device::CART_ENV
        )
    })?;
    log::debug!("Claimed EMS cart");

    match operation {
        Operation::Read { file, request } => commands::read_cart(&mut cart, &file, &request)?,
        Operation::Write { file, request } => commands::write_cart(&mut cart, &file, &request)?,
        Operation::Title => commands::print_titles(&mut cart)?,
    }

    cart.flush().context("Can't flush the cart image")?;

    Ok(())
}
