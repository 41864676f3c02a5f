use common::protocol::{ClientMessage, Direction, RoomCode, ServerMessage, Side};
use rand::SeedableRng;
use rand::rngs::StdRng;
use renet::ClientId;
use thiserror::Error;
use tracing::info;

use crate::registry::RoomRegistry;

/// What a handled request wants done to the outside world. Keeping
/// transport and timers out of the logic layer means every handler can
/// be exercised without a live connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send {
        client_id: ClientId,
        message: ServerMessage,
    },
    StartLoop {
        room_code: RoomCode,
    },
    StopLoop {
        room_code: RoomCode,
    },
}

/// Benign protocol misuse, usually a race against a disconnect or a
/// state change. Logged at debug by the caller and otherwise dropped;
/// nothing here reaches the offending client or mutates state.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("connection is not bound to a room")]
    NotInRoom,
    #[error("room {0} no longer exists")]
    RoomGone(RoomCode),
    #[error("game is not in progress")]
    NotPlaying,
    #[error("restart requires both sides occupied")]
    MissingOpponent,
}

pub struct ServerLogic {
    registry: RoomRegistry,
    rng: StdRng,
}

impl Default for ServerLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerLogic {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: RoomRegistry::new(),
            rng,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn registry_mut(&mut self) -> &mut RoomRegistry {
        &mut self.registry
    }

    pub fn handle_message(
        &mut self,
        client_id: ClientId,
        message: ClientMessage,
    ) -> Result<Vec<Effect>, RequestError> {
        match message {
            ClientMessage::CreateRoom => Ok(self.handle_create_room(client_id)),
            ClientMessage::JoinRoom { room_code } => Ok(self.handle_join_room(client_id, room_code)),
            ClientMessage::PlayerInput { direction } => {
                self.handle_player_input(client_id, direction)
            }
            ClientMessage::RestartGame => self.handle_restart(client_id),
        }
    }

    pub fn on_disconnect(&mut self, client_id: ClientId) -> Vec<Effect> {
        self.detach_connection(client_id)
    }

    /// One scheduler tick for `room_code`. Any state in which the room
    /// cannot simulate cancels its loop; a later transition back into
    /// Playing re-arms it.
    pub fn on_room_tick(&mut self, room_code: RoomCode) -> Vec<Effect> {
        let Some(room) = self.registry.get_mut(&room_code) else {
            return vec![Effect::StopLoop { room_code }];
        };
        if !room.is_playing() {
            return vec![Effect::StopLoop { room_code }];
        }

        let ended = room.advance(&mut self.rng);
        let snapshot = room.state().clone();
        let occupants = room.occupants();

        let mut effects: Vec<Effect> = occupants
            .iter()
            .map(|&occupant| Effect::Send {
                client_id: occupant,
                message: ServerMessage::GameStateUpdate {
                    state: snapshot.clone(),
                },
            })
            .collect();

        if ended && let Some(winner) = snapshot.winner {
            info!(%room_code, %winner, "game ended");
            for &occupant in &occupants {
                effects.push(Effect::Send {
                    client_id: occupant,
                    message: ServerMessage::GameEnded { winner },
                });
            }
            effects.push(Effect::StopLoop { room_code });
        }

        effects
    }

    fn handle_create_room(&mut self, client_id: ClientId) -> Vec<Effect> {
        let mut effects = self.detach_connection(client_id);

        let room_code = self.registry.create_room(&mut self.rng);
        let side = self
            .registry
            .get_mut(&room_code)
            .and_then(|room| room.add_player(client_id))
            .expect("a freshly created room has a vacant side");
        self.registry.bind(client_id, room_code.clone(), side);
        info!(%client_id, %room_code, "room created");

        effects.push(Effect::Send {
            client_id,
            message: ServerMessage::RoomCreated {
                room_code: room_code.clone(),
            },
        });
        effects.push(Effect::Send {
            client_id,
            message: ServerMessage::PlayerJoined { side },
        });
        effects
    }

    fn handle_join_room(&mut self, client_id: ClientId, raw_code: RoomCode) -> Vec<Effect> {
        let mut effects = self.detach_connection(client_id);
        let room_code = RoomCode::normalized(&raw_code.0);

        let (side, snapshot, starts) = {
            let room = self.registry.ensure_room(&room_code, &mut self.rng);
            let Some(side) = room.add_player(client_id) else {
                effects.push(Effect::Send {
                    client_id,
                    message: ServerMessage::RoomFull,
                });
                return effects;
            };
            let starts = room.is_full() && !room.state().game_started;
            (side, room.state().clone(), starts)
        };

        self.registry.bind(client_id, room_code.clone(), side);
        info!(%client_id, %room_code, %side, "player joined");

        effects.push(Effect::Send {
            client_id,
            message: ServerMessage::PlayerJoined { side },
        });
        effects.push(Effect::Send {
            client_id,
            message: ServerMessage::GameStateUpdate { state: snapshot },
        });

        if starts && let Some(room) = self.registry.get_mut(&room_code) {
            room.start_game(&mut self.rng);
            let snapshot = room.state().clone();
            let occupants = room.occupants();
            info!(%room_code, "game started");

            for &occupant in &occupants {
                effects.push(Effect::Send {
                    client_id: occupant,
                    message: ServerMessage::GameStarted,
                });
            }
            for &occupant in &occupants {
                effects.push(Effect::Send {
                    client_id: occupant,
                    message: ServerMessage::GameStateUpdate {
                        state: snapshot.clone(),
                    },
                });
            }
            effects.push(Effect::StartLoop { room_code });
        }

        effects
    }

    /// Mutates the caller's paddle and broadcasts the new snapshot
    /// right away rather than waiting for the next tick; this is what
    /// keeps the controls feeling immediate.
    fn handle_player_input(
        &mut self,
        client_id: ClientId,
        direction: Direction,
    ) -> Result<Vec<Effect>, RequestError> {
        let (room_code, side) = self
            .registry
            .resolve(client_id)
            .ok_or(RequestError::NotInRoom)?;
        let room = self
            .registry
            .get_mut(&room_code)
            .ok_or_else(|| RequestError::RoomGone(room_code.clone()))?;

        if !room.apply_input(side, direction) {
            return Err(RequestError::NotPlaying);
        }

        let snapshot = room.state().clone();
        Ok(room
            .occupants()
            .into_iter()
            .map(|occupant| Effect::Send {
                client_id: occupant,
                message: ServerMessage::GameStateUpdate {
                    state: snapshot.clone(),
                },
            })
            .collect())
    }

    fn handle_restart(&mut self, client_id: ClientId) -> Result<Vec<Effect>, RequestError> {
        let (room_code, _) = self
            .registry
            .resolve(client_id)
            .ok_or(RequestError::NotInRoom)?;
        let room = self
            .registry
            .get_mut(&room_code)
            .ok_or_else(|| RequestError::RoomGone(room_code.clone()))?;

        if !room.is_full() {
            return Err(RequestError::MissingOpponent);
        }

        room.restart(&mut self.rng);
        let snapshot = room.state().clone();
        let occupants = room.occupants();
        info!(%room_code, "game restarted");

        let mut effects = Vec::new();
        for &occupant in &occupants {
            effects.push(Effect::Send {
                client_id: occupant,
                message: ServerMessage::GameStarted,
            });
        }
        for &occupant in &occupants {
            effects.push(Effect::Send {
                client_id: occupant,
                message: ServerMessage::GameStateUpdate {
                    state: snapshot.clone(),
                },
            });
        }
        effects.push(Effect::StartLoop { room_code });
        Ok(effects)
    }

    /// Unbinds the connection and updates its room in the same step,
    /// so the reverse indices never disagree with the slots. Handles
    /// both explicit rebinds (create/join while bound) and disconnects.
    fn detach_connection(&mut self, client_id: ClientId) -> Vec<Effect> {
        let Some((room_code, side)) = self.registry.unbind(client_id) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        let mut destroyed = false;
        if let Some(room) = self.registry.get_mut(&room_code) {
            room.remove_player(client_id);
            if room.is_empty() {
                destroyed = true;
            } else {
                room.reset_to_waiting(&mut self.rng);
                let snapshot = room.state().clone();
                for occupant in room.occupants() {
                    effects.push(Effect::Send {
                        client_id: occupant,
                        message: ServerMessage::PlayerDisconnected,
                    });
                    effects.push(Effect::Send {
                        client_id: occupant,
                        message: ServerMessage::GameStateUpdate {
                            state: snapshot.clone(),
                        },
                    });
                }
            }
        }

        info!(%client_id, %room_code, %side, "player left room");
        if destroyed {
            let idle = self
                .registry
                .get(&room_code)
                .map(|room| room.last_update().elapsed());
            self.registry.destroy_if_empty(&room_code);
            info!(%room_code, ?idle, "room destroyed");
        }
        effects.push(Effect::StopLoop { room_code });
        effects
    }
}
