//! Engine binary for the Voicelog pipeline.
//!
//! This is the main entry point that wires together the durable journal,
//! the recorder, the NATS upstream source, the GC loop and the Observer API.
//! It loads configuration, initializes all subsystems, and runs until
//! interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `voicelog-config.yaml`
//! 3. Connect the key-value store and restore the journal
//! 4. Restore the observation config and build the recorder
//! 5. Start the Observer API server
//! 6. Connect to NATS and start the upstream source
//! 7. Start the GC loop (first pass runs immediately)
//! 8. Enable ingestion after the warm-up delay
//! 9. On Ctrl-C, stop ingestion, persist, and shut every task down

mod error;
mod nats_source;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use voicelog_core::config::{StoreBackend, VoicelogConfig};
use voicelog_core::gc::run_gc_loop;
use voicelog_core::{Directory, Recorder, Upstream};
use voicelog_db::{DragonflyStore, Journal, KeyValueStore, MemoryStore, load_observation};
use voicelog_observer::{AppState, ServerConfig, spawn_observer};

use crate::error::EngineError;
use crate::nats_source::NatsSource;

const CONFIG_PATH: &str = "voicelog-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Configuration first so the log level can come from it.
    let config = load_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        max_history_size = config.log.max_history_size,
        display_limit = config.log.display_limit,
        warmup_ms = config.ingest.warmup_ms,
        gc_interval_secs = config.gc.interval_secs,
        store_backend = ?config.infrastructure.store_backend,
        "voicelog-engine starting"
    );

    run(config).await?;
    Ok(())
}

async fn run(config: VoicelogConfig) -> Result<(), EngineError> {
    // 3. Store and journal.
    let store = connect_store(&config).await?;
    let journal = Arc::new(Journal::load(Arc::clone(&store), config.log.max_history_size).await?);
    info!(
        log_len = journal.read_log().await.len(),
        "Journal restored"
    );

    // 4. Observation config and recorder.
    let observation = load_observation(store.as_ref()).await?;
    info!(
        observed_groups = observation.observed_groups.len(),
        excluded_rooms = observation.excluded_rooms.len(),
        "Observation config restored"
    );
    let directory = Arc::new(Directory::new());
    let upstream: Arc<dyn Upstream> = Arc::<Directory>::clone(&directory);
    let recorder = Arc::new(
        Recorder::new(
            Arc::clone(&journal),
            upstream,
            observation,
            config.log.display_limit,
        )
        .await,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 5. Observer API.
    let server_config = ServerConfig {
        port: config.infrastructure.observer_port,
        ..ServerConfig::default()
    };
    let observer = spawn_observer(
        &server_config,
        Arc::new(AppState::new(Arc::clone(&recorder))),
        shutdown_rx.clone(),
    )
    .await?;
    info!(addr = %observer.addr, "Observer API server started");

    // 6. NATS upstream.
    let nats_url = &config.infrastructure.nats_url;
    info!(nats_url = %nats_url, "Connecting to NATS");
    let source = NatsSource::connect(nats_url, Arc::clone(&recorder), directory).await?;
    let source_shutdown = shutdown_rx.clone();
    let source_handle = tokio::spawn(async move {
        if let Err(e) = source.run(source_shutdown).await {
            error!(error = %e, "NATS source exited with error");
        }
    });

    // 7. GC.
    let gc_handle = tokio::spawn(run_gc_loop(
        Arc::clone(&journal),
        Duration::from_secs(config.gc.interval_secs),
        shutdown_rx,
    ));

    // 8. Warm-up, then ingestion. Ctrl-C during warm-up skips straight to
    //    shutdown.
    let warmup = Duration::from_millis(config.ingest.warmup_ms);
    let interrupted = tokio::select! {
        () = tokio::time::sleep(warmup) => false,
        signal = tokio::signal::ctrl_c() => {
            log_signal(signal);
            true
        }
    };
    if !interrupted {
        recorder.enable();
        info!("Ingestion enabled");
        log_signal(tokio::signal::ctrl_c().await);
    }

    // 9. Shutdown.
    recorder.disable().await;
    if let Err(e) = recorder.persist_observation().await {
        warn!(error = %e, "Failed to persist observation config on shutdown");
    }
    if shutdown_tx.send(true).is_err() {
        warn!("All shutdown receivers already dropped");
    }
    for (task, handle) in [
        ("observer", observer.handle),
        ("nats", source_handle),
        ("gc", gc_handle),
    ] {
        if let Err(e) = handle.await {
            warn!(task, error = %e, "Task did not shut down cleanly");
        }
    }

    info!("voicelog-engine shutdown complete");
    Ok(())
}

fn log_signal(signal: std::io::Result<()>) {
    match signal {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Signal listener failed, shutting down"),
    }
}

/// Load configuration from `voicelog-config.yaml`, falling back to
/// defaults when the file is absent.
fn load_config() -> Result<VoicelogConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(VoicelogConfig::from_file(config_path)?)
    } else {
        let mut config = VoicelogConfig::default();
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

async fn connect_store(config: &VoicelogConfig) -> Result<Arc<dyn KeyValueStore>, EngineError> {
    match config.infrastructure.store_backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; nothing survives a restart");
            let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            Ok(store)
        }
        StoreBackend::Dragonfly => {
            let url = &config.infrastructure.dragonfly_url;
            info!(url = %url, "Connecting to Dragonfly");
            let store: Arc<dyn KeyValueStore> = Arc::new(DragonflyStore::connect(url).await?);
            Ok(store)
        }
    }
}
