use std::error::Error;
use std::fs::{self, File};
use std::path::Path;

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

pub const DEBUG_FILE: &str = "debug.txt";

/// Terminal logging, plus `debug.txt` in the world directory when `to_file` is set.
pub fn init(world: &Path, verbose: bool, to_file: bool) -> Result<(), Box<dyn Error>> {
    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if to_file {
        fs::create_dir_all(world)?;
        let file = File::create(world.join(DEBUG_FILE))?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}
