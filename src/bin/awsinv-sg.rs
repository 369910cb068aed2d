use anyhow::Result;
use awsinv::aws::{AwsSessionFactory, SessionFactory};
use awsinv::logging::{setup_logging, LogLevel};
use awsinv::report::DEFAULT_OUTPUT_DIR;
use awsinv::sg_report::{self, SgReport};
use clap::Parser;
use std::path::PathBuf;

/// List security groups across regions and flag the ones open to the internet
#[derive(Parser, Debug)]
#[command(name = "awsinv-sg", version, about, long_about = None)]
struct Args {
    /// Regions to inspect (default: every region enabled for the account)
    #[arg(long = "region", value_name = "REGION", num_args = 1..)]
    regions: Vec<String>,

    /// Directory reports are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = setup_logging(args.log_level, None)?;

    println!("AWS security groups report");
    if args.regions.is_empty() {
        println!("Regions: all enabled regions");
    } else {
        println!("Regions: {}", args.regions.join(", "));
    }

    let factory = AwsSessionFactory::load().await;
    let session = factory.session(None);
    if sg_report::verify_credentials(session.as_ref()).await.is_none() {
        return Ok(());
    }

    let regions = sg_report::resolve_regions(session.as_ref(), &args.regions).await;
    let mut report = SgReport::new(regions);

    let interrupted = tokio::select! {
        _ = sg_report::collect(&mut report, &factory) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        println!("\nInterrupted by user.");
        return Ok(());
    }

    sg_report::write_report(&report, &args.output_dir)?;
    sg_report::print_summary(&report);
    println!("\nSecurity groups report complete.");

    Ok(())
}
