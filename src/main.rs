use salary_report::utils::{logger, validation::Validate};
use salary_report::{CliConfig, LocalStorage, ReportEngine, ReportError, SalaryReportPipeline};

fn report_failure(stage: &str, e: &ReportError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::load();

    // 初始化日誌
    let verbose = config.as_ref().map(|c| c.verbose).unwrap_or(false);
    logger::init_cli_logger(verbose);

    let config = match config {
        Ok(config) => config,
        Err(e) => report_failure("Configuration loading", &e),
    };

    tracing::info!("Starting salary-report CLI");
    if let Some(path) = &config.config {
        tracing::info!("📄 Merged configuration from {}", path);
    }
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        report_failure("Configuration validation", &e);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 路徑相對於目前工作目錄
    let storage = LocalStorage::new(".");
    let pipeline = SalaryReportPipeline::new(storage, config);
    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(written) => {
            tracing::info!("✅ Salary report completed successfully!");
            for path in &written {
                tracing::info!("📁 Chart saved to: {}", path);
            }
        }
        Err(e) => report_failure("Salary report", &e),
    }

    Ok(())
}
