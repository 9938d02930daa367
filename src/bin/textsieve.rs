//! CLI entry point: evaluate a pipeline expression against stdin.
//!
//! Usage:
//!   textsieve '<Filter>[ | <Filter>]...'
//!
//! Exit code 0 on success, 1 on any error.

use std::process;

fn main() {
    process::exit(textsieve::cli::run());
}
