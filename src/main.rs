use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use overmap_generator::export;
use overmap_generator::monsters::MonsterRegistry;
use overmap_generator::persistence::SaveDir;
use overmap_generator::{GenerationConfig, OvermapBuffer, Result, WorldSeed};

#[derive(Parser, Debug)]
#[command(name = "overmap_generator")]
#[command(about = "Generate survival-game overmaps with cities, rivers and dungeons")]
struct Args {
    /// World seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Region grid X coordinate
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    x: i32,

    /// Region grid Y coordinate
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    y: i32,

    /// Also generate every region within this many steps of (x, y)
    #[arg(short, long, default_value = "0")]
    radius: i32,

    /// Directory holding save files
    #[arg(long, default_value = "save")]
    save_dir: PathBuf,

    /// Player whose visibility and notes are read and written
    #[arg(long, default_value = "player")]
    player: String,

    /// Generation configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monster category definitions (JSON)
    #[arg(long)]
    monsters: Option<PathBuf>,

    /// Export the chosen level to PNG
    #[arg(long)]
    export_png: Option<PathBuf>,

    /// Pixels per tile in the PNG export
    #[arg(long, default_value = "2")]
    scale: u32,

    /// Export the chosen level of region (x, y) as text
    #[arg(long)]
    export_ascii: Option<PathBuf>,

    /// Level to export
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    z: i32,

    /// Print the default configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.dump_config {
        println!("{}", GenerationConfig::default().to_json()?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    let monsters = match &args.monsters {
        Some(path) => MonsterRegistry::load(path)?,
        None => MonsterRegistry::builtin(),
    };

    let seed = args.seed.map_or_else(WorldSeed::default, WorldSeed::new);

    // keep the whole block in memory so it can be exported as one image
    let radius = args.radius.max(0);
    let side = (2 * radius + 1) as usize;
    let config = GenerationConfig {
        cache_capacity: config.cache_capacity.max(side * side),
        ..config
    };
    let mut buffer =
        OvermapBuffer::new(seed, SaveDir::new(&args.save_dir), &args.player, config).with_monsters(monsters);
    info!(seed = %buffer.seed(), x = args.x, y = args.y, radius = args.radius, "starting");

    // row by row from the north-west so every region sees its north and
    // west neighbours
    for ry in args.y - radius..=args.y + radius {
        for rx in args.x - radius..=args.x + radius {
            let om = buffer.get_or_create(rx, ry)?;
            info!(
                x = rx,
                y = ry,
                cities = om.cities.len(),
                groups = om.monster_groups.len(),
                radios = om.radios.len(),
                "region ready"
            );
        }
    }

    if let Some(path) = &args.export_ascii {
        let om = buffer.get_or_create(args.x, args.y)?;
        export::export_ascii(om, args.z, path)?;
        info!(path = %path.display(), z = args.z, "wrote text map");
    }

    if let Some(path) = &args.export_png {
        let mut regions = Vec::new();
        for ry in args.y - radius..=args.y + radius {
            for rx in args.x - radius..=args.x + radius {
                if let Some(om) = buffer.get(rx, ry) {
                    regions.push(om);
                }
            }
        }
        let img = export::render_mosaic(&regions, args.z, args.scale)?;
        img.save(path)?;
        info!(path = %path.display(), z = args.z, regions = regions.len(), "wrote image");
    }

    buffer.save_all()
}
