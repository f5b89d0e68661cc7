//! Tessera binary entry point.

use tessera_lib::cli;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("{}", cli::format_error(&err.to_string()));
        if err.is_config() {
            eprintln!("Run `tessera schema` for every configuration option.");
        }
        std::process::exit(1);
    }
}
