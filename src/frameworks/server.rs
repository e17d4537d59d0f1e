// Framework bootstrap for the arena host runtime.

use crate::frameworks::config::{self, ArenaConfig};
use crate::interface_adapters::net::{world_update_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::game::{LoopSettings, WorldChannels, world_task};
use crate::use_cases::presentation::{Presenter, presentation_task};
use crate::use_cases::{GameEvent, HostSimulation, ServerState, WorldUpdate};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state()?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

// Configuration errors abort startup before any task is spawned.
fn build_state() -> Result<Arc<AppState>> {
    let path = config::arena_config_path();
    let (arena, tick_rate, settings) = ArenaConfig::load(path.as_deref())
        .and_then(|arena| {
            let tick_rate = config::tick_rate()?;
            let settings = arena.host_settings(config::seed())?;
            Ok((arena, tick_rate, settings))
        })
        .inspect_err(|e| tracing::error!(error = %e, "invalid arena configuration"))
        .map_err(std::io::Error::other)?;
    tracing::debug!(
        config = ?path,
        tick_rate = tick_rate.ticks_per_second(),
        spawn_points = arena.spawn_points.len(),
        compensation = ?arena.compensation,
        "arena configured"
    );

    // input_tx/rx: All client inputs go to the single world task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);
    // world_tx/rx: World updates are broadcast to the wire serializer.
    let (world_tx, _world_rx) = broadcast::channel::<WorldUpdate>(config::WORLD_BROADCAST_CAPACITY);
    // snapshot_tx/rx: Latest update only, read by the presentation observer.
    let (snapshot_tx, snapshot_rx) = watch::channel(WorldUpdate::default());
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::WORLD_BROADCAST_CAPACITY);
    let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    let (server_state_tx, _server_state_rx) = watch::channel::<ServerState>(ServerState::Lobby);

    let state = Arc::new(AppState {
        input_tx,
        world_tx,
        world_bytes_tx,
        world_latest_tx,
        server_state_tx,
        ping_interval: config::PING_INTERVAL,
    });

    // Subscribe before the world task starts so the first tick is not missed.
    tokio::spawn(world_update_serializer(
        state.world_tx.subscribe(),
        state.world_bytes_tx.clone(),
        state.world_latest_tx.clone(),
    ));

    tokio::spawn(presentation_task(
        snapshot_rx,
        Presenter::new(arena.player, tick_rate),
        config::presentation_interval(),
    ));

    tokio::spawn(world_task(
        HostSimulation::new(settings),
        input_rx,
        WorldChannels {
            world_tx: state.world_tx.clone(),
            snapshot_tx,
            server_state_tx: state.server_state_tx.clone(),
        },
        LoopSettings {
            tick_rate,
            match_start_delay: config::match_start_delay(),
        },
    ));

    Ok(state)
}
