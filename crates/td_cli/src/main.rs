use clap::Parser;
use std::process::ExitCode;
use td_cli::Settings;
use td_core::logging::init_logging;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Daily tech news digest for a chat webhook", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Check configuration, feeds and webhook without running the pipeline
    #[arg(long, conflicts_with = "quality_report")]
    health: bool,

    /// Fetch only and post a trust-score report
    #[arg(long)]
    quality_report: bool,

    /// Render the digest and log it instead of posting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.settings.log_level);

    let mut leader = match cli.settings.build_leader(cli.dry_run) {
        Ok(leader) => leader,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if cli.health {
        info!("🩺 Running health check");
        let report = leader.health_check().await;
        return if report.is_healthy() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    if cli.quality_report {
        info!("📈 Generating quality report");
        return if leader.quality_report().await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let result = leader.run().await;
    if result.success {
        info!(
            articles = result.articles_processed,
            fallback_summaries = result.fallback_summaries,
            "🎉 Digest delivered"
        );
        ExitCode::SUCCESS
    } else {
        error!(
            state = %result.state,
            error = result.error.as_deref().unwrap_or("unknown"),
            "Digest run failed"
        );
        ExitCode::FAILURE
    }
}
