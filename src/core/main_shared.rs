use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use log::{debug, error, info, warn};

use crate::core::cli::Args;
use crate::core::db::DbSettings;
use crate::core::driver;
use crate::core::logging::init_logging;
use crate::core::report::ReportFormat;
use crate::types::config::{CliOverrides, Config, config, init_with_overrides};
use crate::types::{AppResult, WorkloadPlan};

/// Validate the workload and connection settings before touching the database
pub fn resolve_run(cfg: &Config) -> AppResult<(WorkloadPlan, DbSettings)> {
    let run = cfg.run();
    let plan = WorkloadPlan::new(
        run.query(),
        run.interval(),
        run.concurrency(),
        run.iteration(),
    )?;
    let settings = DbSettings::from_config(&cfg.db(), plan.concurrency())?;
    Ok((plan, settings))
}

pub async fn run_main() -> AppResult<()> {
    let args = Args::parse();

    // Build CLI overrides for config precedence
    let cli_overrides = CliOverrides {
        config: args.config.clone(),
        host: args.host.clone(),
        user: args.user.clone(),
        password: args.password.clone(),
        database: args.database.clone(),
        url: args.url.clone(),
        query: args.query.clone(),
        interval: args.interval,
        concurrency: args.concurrency,
        iteration: args.iteration,
        log_level: args.log_level.clone(),
        log_color: args.log_color.clone(),
    };

    // Initialize configuration (file, then CLI overrides)
    init_with_overrides(&cli_overrides)?;

    // Initialize logging after config so level/color are applied
    init_logging();
    debug!("Effective configuration: {:?}", config().run());

    let (plan, settings) = match resolve_run(config()) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let format = ReportFormat::from_str(&args.format).unwrap_or_else(|_| {
        warn!("Unknown report format '{}', using table", args.format);
        ReportFormat::Table
    });

    // Setup running flag to handle signals from ctrl-c
    let running = Arc::new(AtomicBool::new(true));
    let running_ctrlc = Arc::clone(&running);
    ctrlc::set_handler(move || {
        warn!("Received Ctrl-C, stopping workers..");
        running_ctrlc.store(false, Ordering::SeqCst);
    })?;

    let report = match driver::run(&plan, &settings, Arc::clone(&running)).await {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    report.render(format)?;

    if report.interrupted() {
        info!("Interrupted after {} executions", report.stats().total_executions());
        std::process::exit(2);
    }

    Ok(())
}
