//! pagegen CLI
//!
//! Generates a paginated token-enumeration script for a deployed contract
//! and prints the compiled NeoVM bytecode as a single line of lowercase
//! hex. Failures are reported on stderr with a nonzero exit status.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use pagegen::ast::PageRequest;

#[derive(Parser)]
#[command(name = "pagegen")]
#[command(version)]
#[command(about = "Compile a paginated tokensOf call to NeoVM bytecode", long_about = None)]
struct Cli {
    /// Script hash of the deployed token contract (hex)
    #[arg(value_name = "CONTRACT_HASH")]
    contract_hash: String,

    /// Owner address as a hex string
    #[arg(value_name = "ADDRESS")]
    address: String,

    /// Zero-based page index
    #[arg(value_name = "PAGE")]
    page: u64,

    /// Maximum number of tokens per page
    #[arg(value_name = "PAGE_LIMIT")]
    page_limit: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let request =
        match PageRequest::new(&cli.contract_hash, &cli.address, cli.page, cli.page_limit) {
            Ok(request) => request,
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                return ExitCode::FAILURE;
            }
        };

    match pagegen::render_and_compile(&request) {
        Ok(bytecode) => {
            println!("{bytecode}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
