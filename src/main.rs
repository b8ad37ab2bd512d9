use clap::Parser;
use lease_ledger::utils::error::ErrorCategory;
use lease_ledger::utils::logger;
use lease_ledger::{app, CliConfig};

fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::debug!("CLI config: {:?}", config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = app::run(&config, &mut out) {
        tracing::error!("❌ Command failed: {} (Category: {:?})", e, e.category());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.category() {
            ErrorCategory::Storage => 1,
            ErrorCategory::Input | ErrorCategory::Conflict => 2,
            ErrorCategory::Config => 3,
        };
        std::process::exit(exit_code);
    }
}
