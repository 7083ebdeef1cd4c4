/// Strata Terminal - layered mesh viewer
///
/// Shows the built-in demo layers plus any STL files given on the command
/// line, each with its measured volume.
/// Controls:
///   - WASD / Arrow Keys: Rotate
///   - IJKL: Pan, +/-: Zoom, 0: Reset view
///   - Tab: Select layer, V: Show/hide, [ ]: Opacity, X: Delete
///   - B/N: Background brightness, R: Reset layers
///   - Q/ESC: Quit

use clap::Parser;
use env_logger::Env;
use log::info;
use std::io;
use strata_terminal::{AppConfig, Cli, TerminalApp};

fn main() -> io::Result<()> {
    // Logs go to stderr; redirect it to keep the screen clean
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = AppConfig::from(Cli::parse());
    info!(
        "starting with {} seed layers and {} file(s)",
        config.seed.len(),
        config.files.len()
    );

    let mut app = TerminalApp::new(config)?;
    app.run()?;

    println!("{} layers at exit", app.store().len());
    Ok(())
}
