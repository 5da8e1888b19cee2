use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use ray_tracer::scene;
use ray_tracer::parallel::RenderOptions;
use ray_tracer::consts::DEFAULT_RECURSION_DEPTH;

/// Renders a JSON scene description to a PPM image.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Scene description to render.
    scene: PathBuf,

    /// Where to write the rendered image.
    #[clap(short, long, default_value = "out.ppm")]
    output: PathBuf,

    /// Number of render threads. Defaults to the available parallelism.
    #[clap(short, long)]
    threads: Option<usize>,

    /// Maximum reflection and refraction recursion depth.
    #[clap(short, long, default_value_t = DEFAULT_RECURSION_DEPTH)]
    depth: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let (world, camera) = scene::load(&args.scene)?;

    let defaults = RenderOptions::default();
    let options = RenderOptions {
        workers: args.threads.unwrap_or(defaults.workers),
        max_depth: args.depth,
    };

    let canvas = camera.render(&world, &options)?;
    canvas.save(&args.output)?;
    info!("saved render to {}", args.output.display());

    Ok(())
}
