use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serenity::http::Http;
use serenity::prelude::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};

use glorp_agent::openai::OpenAiProvider;
use glorp_agent::{AiEngine, EngineSettings, HistoryStore, LlmProvider};
use glorp_core::config::{GlorpConfig, DEFAULT_CONFIG_PATH};
use glorp_core::Backoff;
use glorp_discord::cooldown::CooldownTracker;
use glorp_discord::presence;
use glorp_discord::random::{RandomSource, SystemRandom};
use glorp_discord::reactions::ReactionQueue;
use glorp_discord::votes::VoteBoard;
use glorp_discord::{
    DiscordAdapter, Dispatcher, DispatcherDeps, Gateway, GlorpHandler, SerenityGateway,
};

mod supervisor;

use supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "glorp", version, about = "A Discord bot from outer space")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, env = "GLORP_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glorp=info,glorp_discord=info,glorp_agent=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match GlorpConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(code = e.code(), path = %cli.config, "config load failed: {e}");
            return Err(e.into());
        }
    };
    info!(path = %cli.config, model = %config.model, "config loaded");

    match config.invite_url() {
        Some(url) => info!("invite glorp with: {url}"),
        None => warn!("client_id not set, no invite URL available"),
    }

    let resolved = config.resolve_model()?;
    info!(
        provider = %resolved.provider,
        model = %resolved.model,
        base_url = %resolved.base_url,
        "LLM provider configured"
    );
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::from_resolved(&resolved));

    let history = Arc::new(HistoryStore::new(
        config.history.max_turns,
        Duration::from_secs(config.history.max_age_secs),
    ));
    let engine = Arc::new(AiEngine::new(
        provider,
        Arc::clone(&history),
        EngineSettings::from_config(&config)?,
    ));

    let random: Arc<dyn RandomSource> = Arc::new(SystemRandom::new());
    let reactions = Arc::new(ReactionQueue::default());
    let dispatcher = Arc::new(Dispatcher::standard(DispatcherDeps {
        random: Arc::clone(&random),
        cooldowns: Arc::new(CooldownTracker::default()),
        reactions: Arc::clone(&reactions),
        votes: Arc::new(VoteBoard::new()),
        engine,
    }));

    // REST client, independent of the gateway connection; survives reconnects.
    let gateway: Arc<dyn Gateway> =
        Arc::new(SerenityGateway::new(Arc::new(Http::new(&config.bot_token))));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let (context_tx, context_rx) = watch::channel::<Option<Context>>(None);

    let mut supervisor = Supervisor::new(shutdown_rx.clone());
    {
        let reactions = Arc::clone(&reactions);
        let gateway = Arc::clone(&gateway);
        let shutdown = shutdown_rx.clone();
        supervisor.spawn("reaction_worker", move || {
            Arc::clone(&reactions).run_worker(Arc::clone(&gateway), shutdown.clone())
        });
    }
    {
        let history = Arc::clone(&history);
        let interval = Duration::from_secs(config.history.cleanup_interval_secs);
        let shutdown = shutdown_rx.clone();
        supervisor.spawn("history_cleanup", move || {
            Arc::clone(&history).run_cleanup(interval, shutdown.clone())
        });
    }
    {
        let random = Arc::clone(&random);
        let interval = Duration::from_secs(config.presence.interval_secs);
        let shutdown = shutdown_rx.clone();
        supervisor.spawn("status_rotation", move || {
            let context_rx = context_rx.clone();
            let apply = move |status: &'static presence::Status| {
                if let Some(ctx) = context_rx.borrow().as_ref() {
                    ctx.set_activity(Some(status.activity()));
                }
            };
            presence::run_rotation(apply, Arc::clone(&random), interval, shutdown.clone())
        });
    }
    info!(jobs = supervisor.len(), "background jobs started");

    {
        let shutdown_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
        });
    }

    let handler = GlorpHandler {
        dispatcher,
        gateway,
        random,
        context_tx: Arc::new(context_tx),
    };
    let adapter = DiscordAdapter::new(&config.bot_token, handler, Backoff::default());
    let result = adapter.run(shutdown_rx).await;

    let _ = shutdown_tx.send(true);
    supervisor.join().await;

    if let Err(e) = result {
        error!(error = %e, "Discord connection failed, exiting");
        return Err(e.into());
    }
    info!("glorp stopped");
    Ok(())
}
