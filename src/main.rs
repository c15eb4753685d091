//! buildmatrix - build every configuration of a CMake project
//!
//! Entry point for the buildmatrix command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use buildmatrix::cli::output::display_error;
use buildmatrix::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = cli.output_config();

    // RUST_LOG wins over -v/-q
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(output.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            display_error(&e);
            1
        }
    };
    std::process::exit(code);
}
