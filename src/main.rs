use anyhow::{Context, Result};
use clap::Parser;
use notify::{RecursiveMode, Watcher};
use slotbot_core::{AppConfig, ConfigDiff, ConversationRef, PromptError, TurnContext};
use slotbot_prompt::{PromptOptions, PromptTurnController, SlotBot, TurnOutcome};
use slotbot_recognizer::RecognizerRegistry;
use slotbot_transport::TransportRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slotbot", about = "Slot-filling prompt bot")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "slotbot.toml")]
    config: PathBuf,

    /// Conversation id used for stdin turns
    #[arg(long, default_value = "local")]
    conversation: String,

    /// Locale attached to every turn
    #[arg(long)]
    locale: Option<String>,

    /// Do not reload the prompt settings when the config file changes
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("slotbot starting");

    let recognizer = RecognizerRegistry::new()
        .build(&config.recognizer.engine, config.recognizer.options.clone())
        .await
        .with_context(|| {
            format!(
                "failed to initialize recognizer '{}'",
                config.recognizer.engine
            )
        })?;

    let mut transport = TransportRegistry::new()
        .build(&config.transport.engine, config.transport.options.clone())
        .await
        .with_context(|| {
            format!(
                "failed to initialize transport '{}'",
                config.transport.engine
            )
        })?;

    // Echo everything the bot says to stdout
    if let Some(mut outbox) = transport.take_outbox_receiver() {
        tokio::spawn(async move {
            while let Some(message) = outbox.recv().await {
                println!("bot> {}", message.text);
            }
        });
    } else {
        tracing::warn!(
            "transport '{}' does not mirror its output; replies are not shown",
            config.transport.engine
        );
    }

    let transport: Arc<dyn slotbot_transport::Transport> = Arc::from(transport);
    let controller = Arc::new(
        PromptTurnController::new(
            Arc::clone(&transport),
            Arc::from(recognizer),
            PromptOptions::from_config(&config),
        )
        .context("invalid prompt configuration")?,
    );
    let bot = SlotBot::new(Arc::clone(&controller));

    tracing::info!(
        "recognizer '{}', transport '{}', validator: {}",
        config.recognizer.engine,
        config.transport.engine,
        config
            .validator
            .as_ref()
            .map(|v| format!("value > {} else {}", v.min_value, v.rejection))
            .unwrap_or_else(|| "none".to_string()),
    );

    // Keep the watcher alive for the duration of the program
    let _watcher = if cli.no_watch {
        None
    } else {
        Some(spawn_config_reload(
            cli.config.clone(),
            config.clone(),
            Arc::clone(&controller),
        )?)
    };

    // Ctrl-C cancels the in-flight turn and stops reading input
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received");
                shutdown.cancel();
            }
        });
    }

    let conversation = ConversationRef::new(&config.general.channel_id, &cli.conversation);
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            break; // stdin closed
        };

        let mut ctx = TurnContext::new(conversation.clone(), line.trim())
            .with_cancellation(shutdown.child_token());
        if let Some(ref locale) = cli.locale {
            ctx = ctx.with_locale(locale);
        }

        match bot.on_turn(&ctx).await {
            Ok(TurnOutcome::Prompted) => {}
            Ok(TurnOutcome::Accepted(result)) => {
                tracing::debug!(text = ?result.text, "slot filled");
            }
            Ok(TurnOutcome::Rejected(result)) => {
                tracing::debug!(status = %result.status, "slot still open");
            }
            Err(PromptError::Cancelled) => break,
            Err(e) => {
                tracing::error!(conversation = %conversation, "turn failed: {e}");
            }
        }
    }

    tracing::info!("shutting down");
    transport
        .shutdown()
        .await
        .context("transport shutdown failed")?;

    Ok(())
}

/// Watch the config file and push reloadable prompt settings into the
/// controller. Anything else is reported as needing a restart.
fn spawn_config_reload(
    path: PathBuf,
    initial: AppConfig,
    controller: Arc<PromptTurnController>,
) -> Result<notify::RecommendedWatcher> {
    let (reload_tx, mut reload_rx) = tokio::sync::mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                let _ = reload_tx.send(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("config watch error: {e}"),
        }
    })
    .context("failed to create config watcher")?;

    watcher
        .watch(&path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {:?}", path))?;

    tokio::spawn(async move {
        let mut current = initial;
        while reload_rx.recv().await.is_some() {
            let next = match AppConfig::load_from_file(&path) {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!("config reload skipped: {e}");
                    continue;
                }
            };

            let diff = ConfigDiff::diff(&current, &next);
            for warning in &diff.non_reloadable {
                tracing::warn!("{warning}");
            }
            match controller.apply_diff(&diff) {
                Ok(true) => tracing::info!("prompt settings reloaded"),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("prompt settings rejected: {e}");
                    continue;
                }
            }
            current = next;
        }
    });

    Ok(watcher)
}
