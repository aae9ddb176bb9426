//! Binary entry point. All wiring lives in the `cli` module.

use clap::Parser;

use codeindex_mcp::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
