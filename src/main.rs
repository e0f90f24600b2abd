mod config;
mod core;
mod render;
mod spatial;
mod types;
mod ui;

use std::{env, error::Error, fs::File, sync::Mutex};

use tracing::{warn, Level};

use crate::config::FieldConfig;

fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;

    let reduced_motion = env::args().skip(1).any(|arg| arg == "--reduced-motion");
    let field_config = FieldConfig::from_env(reduced_motion).inspect_err(|err| {
        warn!(%err, "rejected configuration");
    })?;
    let seed = config::seed_from_env()?;

    ui::run(field_config, seed)
}

// The terminal is in the alternate screen while running, so logs go to a file.
fn init_logging() -> Result<(), Box<dyn Error>> {
    let path = env::var(config::ENV_LOG).unwrap_or_else(|_| config::DEFAULT_LOG_FILE.to_string());
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .init();
    Ok(())
}
