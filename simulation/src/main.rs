//! ResQ - disaster-response mesh simulation
//!
//! Runs store-and-forward relay scenarios over lossy links.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use resq_logging::ResqSubscriberBuilder;

use resq_simulation::SimulationConfig;
use resq_simulation::scenarios;

#[derive(Parser)]
#[command(
    name = "resq-simulation",
    about = "Delay-tolerant mesh simulation for disaster-response messaging",
    version
)]
struct Cli {
    /// TOML file with seed, wait, node and logging settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Mesh-wide RNG seed for reproducible runs
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// How long to let the mesh run, in milliseconds
    #[arg(short, long, global = true)]
    wait_ms: Option<u64>,

    /// Human-readable log output instead of JSON lines
    #[arg(long, global = true)]
    pretty: bool,

    /// Default log level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay five field reports across the four-node disaster mesh
    Demo,

    /// Print the disaster mesh nodes and links
    Topology,
}

impl Cli {
    /// File config with command-line overrides applied
    fn resolve_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(wait_ms) = self.wait_ms {
            config.wait_ms = wait_ms;
        }
        if let Some(level) = &self.level {
            config.logging.default_level = level.clone();
        }
        if self.pretty {
            config.logging.console.pretty = true;
            config.logging.console.ansi = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let _guard = ResqSubscriberBuilder::new()
        .with_config(config.logging.clone())
        .init()?;

    match cli.command {
        Commands::Demo => {
            let report = scenarios::run_disaster_scenario(&config).await?;
            println!("{}", report.summary());
            println!("{}", report.rendered);
        }
        Commands::Topology => {
            let mesh = scenarios::disaster_mesh(&config)?;
            println!("{}", mesh.render_paths(&[]));
        }
    }

    Ok(())
}
