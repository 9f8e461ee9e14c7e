//! `buildmap`: compiles a Tiled map into `<name>.png`, `<name>-overlay.png`
//! (only when overlay tiles exist) and the `<name>.dat` sensor blob.

use log::{error, info, LevelFilter};
use mapbuild::{compile, OutputPaths};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "buildmap", about = "Assembles Tiled maps into runtime map data")]
struct Opt {
    /// Tileset definition (.tsx)
    #[structopt(parse(from_os_str))]
    tileset: PathBuf,

    /// Map definition (.tmx, CSV layers)
    #[structopt(parse(from_os_str))]
    map: PathBuf,

    /// Background image to write [default: the map path with a .png extension]
    #[structopt(parse(from_os_str))]
    output: Option<PathBuf>,

    /// Overlay image to write [default: <output>-overlay.<ext>]
    #[structopt(long, parse(from_os_str))]
    overlay: Option<PathBuf>,

    /// Sensor blob to write [default: <output>.dat]
    #[structopt(long, parse(from_os_str))]
    sensor: Option<PathBuf>,

    /// More output per occurrence
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

impl Opt {
    fn paths(&self) -> OutputPaths {
        let mut paths = match &self.output {
            Some(output) => OutputPaths::from_image(output),
            None => OutputPaths::for_map(&self.map),
        };
        if let Some(overlay) = &self.overlay {
            paths.overlay = overlay.clone();
        }
        if let Some(sensor) = &self.sensor {
            paths.sensor = sensor.clone();
        }
        paths
    }

    /// Level forced on the library by `-v`. Without it `RUST_LOG` decides.
    fn log_level(&self) -> Option<LevelFilter> {
        match self.verbose {
            0 => None,
            1 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        }
    }
}

/// The error followed by each of its causes.
fn report(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn run(opt: &Opt) -> Result<(), mapbuild::Error> {
    info!("compiling {} with {}", opt.map.display(), opt.tileset.display());
    let artifacts = compile(&opt.tileset, &opt.map)?;
    artifacts.commit(&opt.paths())
}

fn main() -> ExitCode {
    let opt = Opt::from_args();
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = opt.log_level() {
        logger.filter_module("mapbuild", level);
    }
    logger.init();

    match run(&opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}
