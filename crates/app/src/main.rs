use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stagehand_core::{
    Actor, AppConfig, Behavior, BehaviorKind, Director, Font, ImageInfo, Interpolator, Path,
    Shape, TimerTask,
};
use tracing_subscriber::EnvFilter;

fn main() -> stagehand_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { config, frames } => run_demo(config.as_ref(), frames),
        Commands::Config { output } => write_config(output.as_ref()),
    }
}

fn load_config(path: Option<&PathBuf>) -> stagehand_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn run_demo(config: Option<&PathBuf>, frames: u32) -> stagehand_core::Result<()> {
    let config = load_config(config)?;
    tracing::info!(?config, frames, "starting demo");

    let mut director = Director::new(&config);
    director.add_image(ImageInfo::new("walker", 64.0, 32.0));
    director.create_scene();

    let mut spin = Behavior::rotate(0.0, std::f64::consts::TAU);
    spin.set_frame_time(0.0, 2000.0)?.set_cycle(true);
    let mut square = Actor::shape(Shape::Rectangle).with_name("square");
    square
        .set_bounds(100.0, 100.0, 80.0, 80.0)
        .set_fill_style("#d33")
        .add_behavior(spin);

    let mut route = Path::new();
    route
        .begin_path(50.0, 400.0)?
        .add_quadric_to(400.0, 200.0, 750.0, 400.0)?
        .end_path()?;
    let mut walk = Behavior::path(route);
    walk.set_frame_time(0.0, 3000.0)?
        .set_ping_pong(true)
        .set_cycle(true)
        .set_interpolator(Interpolator::ExponentialInOut(2.0));
    if let BehaviorKind::Path(follow) = walk.kind_mut() {
        follow.set_auto_rotate(true);
    }
    let mut sprite = director.images().sprite("walker", 1, 2)?;
    sprite.set_change_fps(150.0);
    let mut walker = Actor::sprite(sprite).with_name("walker");
    walker.add_behavior(walk);

    let label = Actor::text("stagehand", Font::parse("bold 20px sans-serif")?, &director)
        .with_name("label");

    let scene = director.current_scene_mut()?;
    let ids = [
        scene.add_child(square)?,
        scene.add_child(walker)?,
        scene.add_child(label)?,
    ];
    scene.add_timer(
        TimerTask::new(0.0, 1000.0)?
            .repeating(true)
            .on_timeout(|event, _scene| tracing::info!(time = event.time, "one second")),
    );

    let reports = director.run_frames(frames)?;
    let expired: usize = reports.iter().map(|r| r.expired_behaviors.len()).sum();

    let scene = director.current_scene()?;
    for id in ids {
        let actor = scene.actor(id)?;
        tracing::info!(
            actor = actor.name(),
            x = actor.x(),
            y = actor.y(),
            rotation = actor.rotation(),
            alpha = actor.alpha(),
            "final state"
        );
    }
    tracing::info!(
        time = director.time(),
        expired,
        draw_commands = director.ctx().len(),
        "demo finished"
    );
    Ok(())
}

fn write_config(output: Option<&PathBuf>) -> stagehand_core::Result<()> {
    let json = AppConfig::default().to_json()?;
    match output {
        Some(path) => {
            tracing::info!(?path, "writing default configuration");
            std::fs::write(path, json)?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "2D scene-graph animation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a small animated scene and run it headless for a number of frames.
    Demo {
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of fixed-step frames to simulate.
        #[arg(short, long, default_value_t = 120)]
        frames: u32,
    },
    /// Print the default configuration, or write it to a file.
    Config {
        /// Destination path; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
