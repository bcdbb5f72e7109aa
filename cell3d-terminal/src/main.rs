/// cell3d terminal viewer - spinning mesh with a free-look camera
///
/// Controls:
///   - Arrow Keys: Move the camera up/down/left/right
///   - W/S: Fly forward/back
///   - A/D: Turn left/right
///   - R/F: Look up/down
///   - Q/ESC: Quit
use std::fs::File;

use cell3d_core::{obj, Mesh};
use cell3d_terminal::{Args, RenderConfig, TerminalApp};
use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let mut logger = env_logger::Builder::new();
    logger.filter_level(log::LevelFilter::Info).parse_default_env();
    if let Some(path) = &args.log_file {
        logger.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    logger.init();

    log::info!("Starting cell3d terminal viewer...");

    let config = match RenderConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Rejected configuration: {}", err);
            return Err(err.into());
        }
    };

    let mesh = match &args.mesh {
        Some(path) => obj::load_obj(path)?,
        None => {
            log::info!("No mesh given, using the unit cube");
            Mesh::unit_cube()
        }
    };

    let mut app = TerminalApp::new(mesh, config)?.keep_logging(args.log_file.is_some());
    app.run()?;

    log::info!("Viewer closed");
    Ok(())
}
