use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;

use stacksynth::{config_loader, manifest, orchestrator};

/// Deployment topology synthesizer for containerized service stacks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the stack YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory for manifest.json and outputs.yaml
    #[arg(short, long, default_value = "stacksynth_output")]
    output: PathBuf,

    /// Synthesize and report without writing any files
    #[arg(long)]
    check: bool,

    /// Log level when RUST_LOG is unset; overrides general.log_level
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let level = args
        .log_level
        .clone()
        .or_else(|| config_loader::configured_log_level(&args.config))
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Starting StackSynth v{}", env!("CARGO_PKG_VERSION"));
    info!("Stack file: {:?}", args.config);

    let config = config_loader::load_config(&args.config)?;

    let graph = match orchestrator::synthesize_stack(&config) {
        Ok(graph) => graph,
        Err(failure) => {
            error!(
                "Partial topology at {}: {} boundary(ies), {} edge(s), {} compiled service(s)",
                failure.state,
                failure.partial.security.boundaries().len(),
                failure.partial.security.edges().len(),
                failure.partial.services.len()
            );
            return Err(failure.into());
        }
    };

    if let Some(routes) = &graph.routes {
        for (priority, pattern, target) in routes.summary() {
            info!("  route {:>5}  {:<24} -> {}", priority, pattern, target);
        }
    }
    for output in graph.manual_outputs() {
        warn!("{} ({}) must be populated by hand before first deploy", output.name, output.value);
    }

    if args.check {
        info!("Check passed; no files written");
        return Ok(());
    }

    info!("Output directory: {:?}", args.output);
    let (manifest_path, outputs_path) = manifest::write_artifacts(&graph, &args.output)?;
    info!("Manifest: {:?}", manifest_path);
    info!("Outputs: {:?}", outputs_path);

    info!("Synthesis completed successfully");
    Ok(())
}
