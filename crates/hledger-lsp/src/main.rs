//! hledger language server binary.
//!
//! Usage:
//!   hledger-lsp [options]
//!
//! Options:
//!   --stdio      Use stdio for communication (default)
//!   --log        Enable debug logging to stderr
//!   --health     Quick health check
//!   --version    Show version information
//!   --help       Show this help message

use hledger_lsp::LspServer;
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut enable_debug_logging = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stdio" => {}
            "--log" => enable_debug_logging = true,
            "--health" => {
                println!("ok {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "--version" => {
                println!("hledger-lsp {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    // stdout carries the protocol; all logging goes to stderr
    let default_filter = if enable_debug_logging { "hledger=debug" } else { "hledger=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HLEDGER_LSP_LOG")
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hledger-lsp starting");

    let mut server = LspServer::new();
    match server.run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            tracing::error!(error = %err, "server terminated with an I/O error");
            process::exit(1);
        }
    }
}

fn print_help() {
    eprintln!("hledger language server");
    eprintln!();
    eprintln!("Usage: hledger-lsp [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio      Use stdio for communication (default)");
    eprintln!("  --log        Enable debug logging to stderr");
    eprintln!("  --health     Quick health check");
    eprintln!("  --version    Show version information");
    eprintln!("  --help       Show this help message");
}
