//! Agora CLI - run agent network simulations from a scenario file.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agora")]
#[command(author, version, about = "Agora - Agent network effects and knowledge diffusion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scenario file (default: agora.toml in this or a parent directory)
    #[arg(short, long, global = true)]
    scenario: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter agora.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite an existing agora.toml
        #[arg(short, long)]
        force: bool,
    },

    /// Show network statistics, central agents and communities
    Stats {
        /// Centrality measure (degree, betweenness, closeness, eigenvector)
        #[arg(short, long, default_value = "degree")]
        centrality: String,

        /// Number of top agents to list
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Apply the scenario's network effects to its resource values
    Effects {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate Bass diffusion over the network
    Diffuse {
        /// Diffusion type (innovation, knowledge, behavior, capability, trust)
        #[arg(short = 't', long = "type")]
        diffusion_type: Option<String>,

        /// Number of steps
        #[arg(short = 'n', long)]
        steps: Option<usize>,

        /// Initial adopters (repeatable; default: from the scenario)
        #[arg(short, long)]
        adopter: Vec<String>,
    },

    /// Run knowledge diffusion and report levels and gaps
    Knowledge {
        /// Number of update rounds
        #[arg(short = 'n', long)]
        steps: Option<usize>,
    },

    /// Find the best teams for the scenario's requirements
    Teams {
        /// Team size
        #[arg(short = 'k', long)]
        size: Option<usize>,

        /// Knowledge update rounds to run first
        #[arg(short = 'n', long, default_value = "0")]
        steps: usize,
    },

    /// Export layout, communities and statistics for visualization
    Export {
        /// Output file path
        output: String,

        /// Export format
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let scenario = cli.scenario.as_deref();
    match cli.command {
        Commands::Init { path, force } => commands::init::run(path, force),
        Commands::Stats { centrality, top } => commands::stats::run(scenario, &centrality, top),
        Commands::Effects { json } => commands::effects::run(scenario, json),
        Commands::Diffuse {
            diffusion_type,
            steps,
            adopter,
        } => commands::diffuse::run(scenario, diffusion_type.as_deref(), steps, &adopter),
        Commands::Knowledge { steps } => commands::knowledge::run(scenario, steps),
        Commands::Teams { size, steps } => commands::teams::run(scenario, size, steps),
        Commands::Export { output, format } => commands::export::run(scenario, &output, &format),
    }
}
