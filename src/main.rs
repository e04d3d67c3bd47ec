use std::{fs::File, io, process, sync::Mutex};

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::EnvFilter;

use ascii_cosmos::{
    config::SceneConfig,
    engine::Scene,
    player::{BufferSurface, Player, Presenter},
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const RUN_USAGE: &str = "ascii-cosmos run [config.json] [--log <file>]";
const SNAPSHOT_USAGE: &str = "ascii-cosmos snapshot <cols> <rows> <ticks> [config.json] [--json]";
const CONFIG_USAGE: &str = "ascii-cosmos config";

struct Args {
    positional: Vec<String>,
    log: Option<String>,
    json: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        positional: Vec::new(),
        log: None,
        json: false,
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--log" => args.log = Some(raw.next().context("--log needs a file path")?),
            "--json" => args.json = true,
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

fn run() -> Result<()> {
    let mut raw = std::env::args().skip(1);
    let command = raw.next();
    let args = parse_args(raw)?;

    match command.as_deref() {
        Some("run") => {
            // The alternate screen owns stdout/stderr while playing, so only
            // errors reach stderr unless a log file is given.
            init_logging(args.log.as_deref(), "error")?;
            let config = load_config(args.positional.first())?;
            play(config)
        }
        Some("snapshot") => {
            init_logging(args.log.as_deref(), "warn")?;
            let mut pos = args.positional.iter();
            let cols = parse_num(pos.next(), "cols")?;
            let rows = parse_num(pos.next(), "rows")?;
            let ticks = parse_num(pos.next(), "ticks")?;
            let config = load_config(pos.next())?;
            snapshot(config, (cols, rows), ticks, args.json)
        }
        Some("config") => {
            println!("{}", serde_json::to_string_pretty(&SceneConfig::default())?);
            Ok(())
        }
        _ => bail!(
            "ASCII Cosmos — layered terminal starfield\n\nUsage:\n  {RUN_USAGE}\n  {SNAPSHOT_USAGE}\n  {CONFIG_USAGE}"
        ),
    }
}

fn init_logging(log_path: Option<&str>, default_filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialise logging: {e}"))
}

fn load_config(path: Option<&String>) -> Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path),
        None => Ok(SceneConfig::default()),
    }
}

fn parse_num<T: std::str::FromStr>(arg: Option<&String>, name: &str) -> Result<T> {
    let arg = arg.with_context(|| format!("missing <{name}>\n\nUsage:\n  {SNAPSHOT_USAGE}"))?;
    arg.parse()
        .map_err(|_| anyhow!("<{name}> must be a non-negative integer, got {arg:?}"))
}

fn play(config: SceneConfig) -> Result<()> {
    let mut player = Player::new(config)?;
    player.play()
}

fn snapshot(config: SceneConfig, viewport: (u32, u32), ticks: usize, json: bool) -> Result<()> {
    let dt = config.tick_interval();
    let mut scene = Scene::new(config, viewport)?;
    let grid = scene.grid();
    let mut surface = BufferSurface::new(grid.width, grid.height);

    for _ in 0..ticks {
        let changes = scene.tick(dt)?;
        if json {
            println!("{}", serde_json::to_string(&changes)?);
        }
        surface.present(&changes)?;
    }

    if !json {
        for row in surface.rows() {
            println!("{row}");
        }
    }

    let totals = surface.totals();
    eprintln!(
        "Rendered {} ticks on a {}x{} grid (seed {}): {} glyph writes, {} effect writes, {} delay writes",
        ticks,
        grid.width,
        grid.height,
        scene.seed(),
        totals.glyphs,
        totals.effects,
        totals.delays,
    );

    Ok(())
}
