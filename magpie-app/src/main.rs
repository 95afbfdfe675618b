use anyhow::Result;
use clap::Parser;
use magpie_common::observability::LogConfig;
use magpie_common::observability::init_logging;
use magpie_config::{MagpieConfig, MagpieConfigLoader};
use magpie_scheduler::Scheduler;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod bot;
mod pipeline;

#[derive(Parser)]
#[command(name = "magpie", version, about = "Scheduled word-riff and trending-story poster")]
struct Cli {
    /// Configuration file; MAGPIE_* environment variables override it.
    #[arg(long, default_value = "magpie.yaml")]
    config: String,

    /// Run one named job immediately and exit instead of scheduling.
    #[arg(long, value_name = "JOB")]
    once: Option<String>,

    /// Bind address for the status and manual-trigger API.
    #[arg(long, env = "MAGPIE_LISTEN", default_value = "127.0.0.1:8686")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: MagpieConfig = MagpieConfigLoader::new().with_file(&cli.config).load()?;

    init_logging(LogConfig::from_env("magpie"))?;

    let bot = Arc::new(bot::build_from_config(&cfg)?);
    let scheduler = Arc::new(Scheduler::new());
    bot::register_jobs(bot, &scheduler, &cfg.schedule).await;

    if let Some(job) = cli.once.as_deref() {
        tracing::info!(job, "run.once");
        let Some(outcome) = scheduler.trigger(job, None).await else {
            anyhow::bail!("unknown job: {job}");
        };
        return outcome;
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("run.shutdown_signal");
            signal_cancel.cancel();
        }
    });

    let tick = std::time::Duration::from_secs(cfg.schedule.tick_secs);
    let scheduler_task = {
        let scheduler = scheduler.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(tick, cancel).await })
    };

    let router = magpie_web::create_router(scheduler);
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    tracing::info!(addr = %listener.local_addr()?, "web.listening");

    let shutdown = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    // If the server exited on its own, take the scheduler down with it.
    cancel.cancel();
    scheduler_task.await?;
    Ok(())
}
