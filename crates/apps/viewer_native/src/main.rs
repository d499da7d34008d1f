//! Headless globe driver: loads a globe package, runs the frame loop and
//! reports what each frame would draw.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use globe::{EngineConfig, EngineEvent, GlobeEngine};
use layers::textures::TextureTag;
use runtime::theme::Theme;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the globe engine headless over a globe package")]
struct Args {
    /// Package directory containing globe.manifest.json
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))]
    package: PathBuf,

    /// Engine config JSON; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting theme (dark or light)
    #[arg(long)]
    theme: Option<String>,

    /// Point to select after startup
    #[arg(long)]
    select: Option<String>,

    /// Toggle the theme every N frames (0 disables)
    #[arg(long, default_value_t = 0)]
    toggle_every: u64,

    /// Number of frames to run
    #[arg(long, default_value_t = 240)]
    frames: u64,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Write the final land texture as raw RGBA8 bytes
    #[arg(long)]
    dump_land: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(theme) = &args.theme {
        config.theme = theme.parse::<Theme>()?;
    }

    let contents = formats::load_package_dir(&args.package)?;
    info!(
        package = %args.package.display(),
        points = contents.points.len(),
        regions = contents.boundaries.len(),
        "package loaded"
    );

    let mut engine = GlobeEngine::new(contents.points, contents.region_map, contents.boundaries, config)?;
    engine.on_select(|id| info!(point = %id, "point clicked"));

    if let Some(id) = &args.select {
        if let Err(err) = engine.set_selected(id) {
            warn!(%err, "selection ignored");
        }
    }

    for n in 0..args.frames {
        if args.toggle_every > 0 && n > 0 && n % args.toggle_every == 0 {
            engine.toggle_theme();
        }
        let frame = engine.tick(args.dt);
        debug!(
            frame = frame.index,
            kinds = ?frame.kinds(),
            label = ?frame.label(),
            "frame composed"
        );
    }

    let mut settled = 0;
    let mut textures_built = 0;
    let mut fallbacks = 0;
    let mut highlights = 0;
    for recorded in engine.drain_events() {
        match recorded.event {
            EngineEvent::FocusSettled => settled += 1,
            EngineEvent::TextureBuilt { tag, fallback } => {
                textures_built += 1;
                if tag.is_highlight() {
                    highlights += 1;
                }
                if fallback {
                    fallbacks += 1;
                }
            }
            _ => {}
        }
    }

    if let Some(path) = &args.dump_land {
        let land = TextureTag::land(engine.theme());
        if let Some(asset) = engine.composer().texture_for(&land) {
            fs::write(path, &asset.pixels)?;
            info!(
                path = %path.display(),
                width = asset.width,
                height = asset.height,
                digest = %asset.digest,
                "land texture written"
            );
        }
    }

    let frame = engine.frame();
    info!(
        frames = args.frames,
        selected = ?engine.selected_id().map(|id| id.as_str()),
        theme = %engine.theme(),
        label = ?frame.label(),
        markers = frame.marker_count(),
        live_textures = engine.composer().textures().live_count(),
        live_bytes = engine.composer().textures().live_bytes(),
        textures_built,
        highlights,
        fallbacks,
        settled,
        "run finished"
    );

    engine.shutdown();
    Ok(())
}
