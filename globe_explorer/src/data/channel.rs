use std::thread;

use bevy::log::{error, info, warn};
use crossbeam_channel::{Receiver, SendError, Sender};

use crate::config::{GlobeConfig, LocationConfig, LocationMode};
use crate::data::flow::{locate_visitor, run_gated_flow};
use crate::data::geolocation::IpGeolocation;
use crate::data::model::{parse_connections, parse_points, LoaderCommand, LoaderEvent};
use crate::data::source::DataSource;
use crate::data::token_gate::SolanaTokenGate;
use crate::data::wallet::ConfiguredWallet;

/// Bevy resource pairing the loader thread's event stream with its command inbox.
/// Systems drain `events` in `ingest_loader_events` and push `commands` from the UI.
#[derive(bevy::prelude::Resource)]
pub struct LoaderChannel {
    pub events: Receiver<LoaderEvent>,
    pub commands: Sender<LoaderCommand>,
}

impl LoaderChannel {
    /// Queues a command; a stopped loader is logged, not fatal.
    pub fn request(&self, command: LoaderCommand) {
        if self.commands.send(command).is_err() {
            warn!(?command, "loader thread is gone, dropping request");
        }
    }
}

/// Everything the loader thread needs, resolved from configuration.
struct Loader {
    client: reqwest::Client,
    points: DataSource,
    connections: DataSource,
    geo: IpGeolocation,
    wallet: ConfiguredWallet,
    gate: Option<SolanaTokenGate>,
    mode: LocationMode,
}

impl Loader {
    fn new(config: &GlobeConfig) -> Self {
        let client = reqwest::Client::new();
        let LocationConfig {
            mode,
            geolocation_url,
            rpc_url,
            token_mint,
            wallet_address,
        } = config.location.clone();
        Self {
            geo: IpGeolocation::new(client.clone(), geolocation_url),
            gate: token_mint.map(|mint| SolanaTokenGate::new(rpc_url, mint)),
            wallet: ConfiguredWallet::new(wallet_address),
            points: config.points.clone(),
            connections: config.connections.clone(),
            client,
            mode,
        }
    }

    async fn handle(
        &self,
        command: LoaderCommand,
        tx: &Sender<LoaderEvent>,
    ) -> Result<(), SendError<LoaderEvent>> {
        match command {
            LoaderCommand::LoadPoints { generation } => {
                if let Some(points) = self.load(&self.points, parse_points).await {
                    info!(count = points.len(), source = %self.points, generation, "points loaded");
                    tx.send(LoaderEvent::Points { generation, points })?;
                }
            }
            LoaderCommand::LoadConnections { generation } => {
                if let Some(connections) = self.load(&self.connections, parse_connections).await {
                    info!(
                        count = connections.len(),
                        source = %self.connections,
                        generation,
                        "connections loaded"
                    );
                    tx.send(LoaderEvent::Connections {
                        generation,
                        connections,
                    })?;
                }
            }
            LoaderCommand::LocateVisitor => {
                locate_visitor(&self.geo, tx).await?;
            }
            LoaderCommand::ConnectWallet => match (&self.gate, self.mode) {
                (Some(gate), LocationMode::TokenGated) => {
                    run_gated_flow(&self.wallet, gate, &self.geo, tx).await?;
                }
                _ => warn!(mode = ?self.mode, "wallet connect requested outside the token-gated mode"),
            },
        }
        Ok(())
    }

    /// Fetches and decodes a static payload; failures are logged and yield nothing.
    async fn load<T>(
        &self,
        source: &DataSource,
        parse: fn(&[u8]) -> Result<Vec<T>, crate::data::LoadError>,
    ) -> Option<Vec<T>> {
        let result = match source.fetch(&self.client).await {
            Ok(bytes) => parse(&bytes),
            Err(err) => Err(err),
        };
        match result {
            Ok(items) => Some(items),
            Err(err) => {
                error!(%source, "failed to load static data: {err}");
                None
            }
        }
    }
}

/// Spawn the loader on a dedicated thread with its own tokio runtime.
/// Commands are handled one at a time, in order.
pub fn spawn_loader(config: &GlobeConfig) -> LoaderChannel {
    let (event_tx, event_rx) = crossbeam_channel::bounded(64);
    let (command_tx, command_rx) = crossbeam_channel::unbounded::<LoaderCommand>();
    let loader = Loader::new(config);

    let spawned = thread::Builder::new()
        .name("globe-loader".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    error!("failed to build tokio runtime: {err}");
                    return;
                }
            };
            while let Ok(command) = command_rx.recv() {
                if rt.block_on(loader.handle(command, &event_tx)).is_err() {
                    return;
                }
            }
        });
    if let Err(err) = spawned {
        error!("failed to spawn loader thread: {err}");
    }

    LoaderChannel {
        events: event_rx,
        commands: command_tx,
    }
}
