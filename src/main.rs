use clap::Parser;
use orchestra_ops::adapters::{DryRunRunner, ShellRunner};
use orchestra_ops::config::cli::Command;
use orchestra_ops::domain::ports::ScriptRunner;
use orchestra_ops::utils::error::ErrorSeverity;
use orchestra_ops::utils::logger::{self, LogFormat};
use orchestra_ops::utils::validation::Validate;
use orchestra_ops::{app, CliConfig, OrchestraConfig, OrchestraError, OrderBook, Scenario};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(LogFormat::from_flag(cli.json_logs), cli.verbose);

    tracing::info!("🚀 Starting orchestra-ops");
    tracing::debug!("CLI config: {:?}", cli);

    match run(&cli).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> Result<String, OrchestraError> {
    tracing::info!("📁 Loading configuration from: {}", cli.config);
    let config = OrchestraConfig::from_file(&cli.config)?;
    config.validate()?;

    match &cli.command {
        Command::Replay { scenario, dry_run } => {
            let scenario = Scenario::from_file(scenario)?;
            scenario.validate()?;

            let runner: Arc<dyn ScriptRunner> = if *dry_run {
                tracing::info!("🔍 DRY RUN MODE - scripts are printed, not executed");
                Arc::new(DryRunRunner::new())
            } else {
                Arc::new(ShellRunner::new(config.orchestration.ssh_user.clone()))
            };

            let report = app::replay(&config, &scenario, runner).await?;
            for log in report.logs.iter().filter(|log| !log.is_success()) {
                tracing::warn!("⚠️ {} on {} ended as {:?}", log.backend, log.server, log.state);
            }
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Command::Chunks { orders, service, from } => {
            let book = OrderBook::from_file(orders)?;
            book.validate()?;
            let from = from.unwrap_or_else(|| chrono::Local::now().date_naive());

            let report = app::billing_report(&config, &book, service, from)?;
            tracing::info!(
                "📊 {} orders, {} chunks until {}",
                report.orders.len(),
                report.chunks.len(),
                report.until
            );
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}
