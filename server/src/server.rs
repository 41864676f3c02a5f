use std::{net::SocketAddr, net::UdpSocket, time::Duration, time::Instant};

use common::codec::{decode_client_message, encode_server_message};
use common::protocol::{RoomCode, ServerMessage};

use crate::scheduler::LoopScheduler;
use crate::server_logic::{Effect, ServerLogic};

use renet::{ClientId, ConnectionConfig, RenetServer, ServerEvent};
use renet_netcode::{NetcodeServerTransport, ServerAuthentication, ServerConfig};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

pub const SERVER_PORT: u16 = 8080;
const MAX_CLIENTS: usize = 64;
const PROTOCOL_ID: u64 = 0;
const RELIABLE_CHANNEL_ID: u8 = 0;

pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct ServerApp {
    server: RenetServer,
    transport: NetcodeServerTransport,

    logic: ServerLogic,
    scheduler: LoopScheduler,

    last_pump: Instant,
}

impl ServerApp {
    pub fn new(tick_tx: UnboundedSender<RoomCode>) -> AppResult<Self> {
        let current_time = Duration::ZERO;
        let public_addr: SocketAddr = ([0, 0, 0, 0], SERVER_PORT).into();
        let server_config = ServerConfig {
            current_time,
            max_clients: MAX_CLIENTS,
            protocol_id: PROTOCOL_ID,
            public_addresses: vec![public_addr],
            authentication: ServerAuthentication::Unsecure,
        };

        let socket = UdpSocket::bind(public_addr)?;
        let transport = NetcodeServerTransport::new(server_config, socket)?;
        let server = RenetServer::new(ConnectionConfig::default());

        Ok(Self {
            server,
            transport,
            logic: ServerLogic::new(),
            scheduler: LoopScheduler::new(tick_tx),
            last_pump: Instant::now(),
        })
    }

    /// Moves bytes in and out of the transport and dispatches whatever
    /// arrived. Room simulation does not happen here; it is driven by
    /// the per-room timers through [`Self::on_room_tick`].
    pub fn pump(&mut self) -> AppResult<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_pump);
        self.last_pump = now;

        self.transport.update(dt, &mut self.server)?;
        self.server.update(dt);

        self.process_net_events();
        self.process_client_messages();

        self.transport.send_packets(&mut self.server);

        Ok(())
    }

    pub fn on_room_tick(&mut self, room_code: RoomCode) {
        let effects = self.logic.on_room_tick(room_code);
        self.apply_effects(effects);
        self.transport.send_packets(&mut self.server);
    }

    pub fn shutdown(&mut self) {
        self.transport.disconnect_all(&mut self.server);
    }

    fn process_net_events(&mut self) {
        while let Some(event) = self.server.get_event() {
            match event {
                ServerEvent::ClientConnected { client_id } => {
                    info!(%client_id, "Client connected");
                }
                ServerEvent::ClientDisconnected { client_id, reason } => {
                    info!(%client_id, ?reason, "Client disconnected");
                    let effects = self.logic.on_disconnect(client_id);
                    self.apply_effects(effects);
                }
            }
        }
    }

    fn process_client_messages(&mut self) {
        let client_ids = self.server.clients_id();
        for client_id in client_ids {
            while let Some(bytes) = self.server.receive_message(client_id, RELIABLE_CHANNEL_ID) {
                let msg = match decode_client_message(bytes.as_ref()) {
                    Ok(m) => m,
                    Err(e) => {
                        debug!(%client_id, %e, "Failed to decode message");
                        continue;
                    }
                };

                match self.logic.handle_message(client_id, msg) {
                    Ok(effects) => self.apply_effects(effects),
                    Err(e) => {
                        debug!(%client_id, %e, "Request ignored");
                    }
                }
            }
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { client_id, message } => self.send_message(client_id, message),
                Effect::StartLoop { room_code } => self.scheduler.start(room_code),
                Effect::StopLoop { room_code } => {
                    self.scheduler.stop(&room_code);
                }
            }
        }
    }

    fn send_message(&mut self, client_id: ClientId, message: ServerMessage) {
        if let Ok(payload) = encode_server_message(&message) {
            self.server
                .send_message(client_id, RELIABLE_CHANNEL_ID, payload);
        }
    }
}
