//! Lists the graphics accelerators of this Mac with their registry IDs

use std::io;
use std::process;

use log::{debug, warn};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let sysname = match gpulist::system_name() {
        Ok(name) => name,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::abort();
        }
    };

    let registry = gpulist::system_registry();
    let config = gpulist::EnumerationConfig::default();
    let stdout = io::stdout();
    let stderr = io::stderr();

    // Exit status stays 0 whatever the registry or the terminal does
    match gpulist::report(
        &sysname,
        &registry,
        &config,
        &mut stdout.lock(),
        &mut stderr.lock(),
    ) {
        Ok(count) => debug!("listed {} accelerator(s)", count),
        Err(e) => warn!("failed to write device list: {}", e),
    }
}
