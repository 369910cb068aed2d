use anyhow::Result;
use awsinv::aws::AwsSessionFactory;
use awsinv::config::Config;
use awsinv::inventory::{self, Run};
use awsinv::logging::{setup_logging, LogLevel};
use awsinv::report;
use awsinv::resource::{get_all_resource_keys, get_registry};
use clap::builder::PossibleValuesParser;
use clap::Parser;
use std::path::PathBuf;

/// Inventory AWS resources into spreadsheet and JSON reports
#[derive(Parser, Debug)]
#[command(name = "awsinv", version, about, long_about = None)]
struct Args {
    /// AWS regions to inventory (default: ap-northeast-2)
    #[arg(long = "region", value_name = "REGION", num_args = 1..)]
    regions: Vec<String>,

    /// Resource types to inventory (default: all)
    #[arg(
        long,
        value_name = "RESOURCE",
        num_args = 1..,
        value_parser = PossibleValuesParser::new(get_all_resource_keys())
    )]
    resources: Vec<String>,

    /// List the available resource types and exit
    #[arg(long)]
    list_resources: bool,

    /// Directory reports are written to (default: data)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Remember the effective regions and resources as defaults
    #[arg(long)]
    save_defaults: bool,
}

fn print_resources() {
    println!("Available resource types:");
    for resource in &get_registry().resources {
        let scope = if resource.is_global { " (global)" } else { "" };
        println!(
            "  {:<22} {}{}",
            resource.key, resource.description, scope
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_resources {
        print_resources();
        return Ok(());
    }

    // Logging depends on the config, so a bad config is reported once it is up
    let (mut config, config_error) = match Config::read() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let log_file = config.effective_log_file(args.log_file.as_deref());
    let _log_guard = setup_logging(args.log_level, log_file.as_deref())?;
    if let Some(e) = config_error {
        tracing::warn!("Ignoring config: {:#}", e);
    }

    let regions = config.effective_regions(&args.regions);
    let resources = config.effective_resources(&args.resources);
    let output_dir = config.effective_output_dir(args.output_dir.as_deref());

    if args.save_defaults {
        config.set_defaults(&regions, &resources)?;
        if let Some(path) = Config::config_path() {
            println!("Defaults saved to {}", path.display());
        }
    }

    let mut run = Run::new(&regions, &resources)?;
    println!("awsinv {}", awsinv::VERSION);
    println!("Regions: {}", run.regions.join(", "));
    if !run.selects_all() {
        let keys: Vec<&str> = run.resources.iter().map(|r| r.key.as_str()).collect();
        println!("Resources: {}", keys.join(", "));
    }
    tracing::info!(
        "Run {}: {} regions, {} resource types",
        run.timestamp,
        run.regions.len(),
        run.resources.len()
    );

    let factory = AwsSessionFactory::load().await;

    let interrupted = tokio::select! {
        _ = inventory::collect(&mut run, &factory) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        println!("\nInterrupted. Writing the results collected so far.");
        tracing::warn!("Run {} interrupted", run.timestamp);
    }

    report::write_run(&run, &output_dir)?;
    report::print_summary(&run);

    Ok(())
}
