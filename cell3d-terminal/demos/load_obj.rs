/// Example: Load an OBJ file and print one frame as plain text
///
/// Usage: cargo run --example load_obj -- path/to/file.obj [frames]
use std::collections::HashSet;
use std::env;

use cell3d_core::{obj, Mesh, PipelineConfig, Scene, SceneConfig, SceneSetup, SpinningMeshScene, Viewport};
use cell3d_terminal::CellRenderer;

const WIDTH: u32 = 80;
const HEIGHT: u32 = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    let mesh = match args.get(1) {
        Some(path) => obj::load_obj(path)?,
        None => {
            eprintln!("Usage: {} <obj-file> [frames]", args[0]);
            eprintln!("\nNo OBJ file provided, using default cube...");
            Mesh::unit_cube()
        }
    };
    let frames: u32 = match args.get(2) {
        Some(count) => count.parse()?,
        None => 10,
    };

    println!("Loaded {} triangles", mesh.len());

    let mut scene = SpinningMeshScene::on_init(SceneSetup {
        mesh,
        pipeline: PipelineConfig::default(),
        scene: SceneConfig::default(),
        viewport: Viewport::new(WIDTH, HEIGHT)?,
    })?;

    // Advance the spin, then print the last frame
    let idle = HashSet::new();
    let mut output = scene.on_frame(0.0, &idle)?;
    for _ in 0..frames {
        output = scene.on_frame(0.1, &idle)?;
    }

    let mut renderer = CellRenderer::new(WIDTH as usize, HEIGHT as usize);
    output.rasterize(&mut renderer);
    for line in renderer.lines() {
        println!("{}", line);
    }

    let stats = output.stats;
    println!(
        "{} in, {} culled, {} degenerate, {} behind near plane, {} drawn",
        stats.input, stats.culled, stats.degenerate, stats.near_clipped, stats.emitted
    );
    Ok(())
}
