use std::collections::HashMap;

use common::protocol::{RoomCode, Side};
use rand::RngCore;
use rand::rngs::StdRng;
use renet::ClientId;

use crate::room::Room;

pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ROOM_CODE_LENGTH: usize = 6;

/// Process-wide room table plus the reverse indices that route a
/// connection back to its room and side. Lives for the whole server
/// process; rooms self-evict when their last occupant leaves.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    connection_rooms: HashMap<ClientId, RoomCode>,
    connection_sides: HashMap<ClientId, Side>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh room under a newly generated code. Collisions
    /// with live codes are handled by regenerating, not by failing.
    pub fn create_room(&mut self, rng: &mut StdRng) -> RoomCode {
        let code = self.generate_code(rng);
        self.rooms.insert(code.clone(), Room::new(rng));
        code
    }

    /// Looks the room up, creating it when the code is unknown.
    pub fn ensure_room(&mut self, code: &RoomCode, rng: &mut StdRng) -> &mut Room {
        self.rooms
            .entry(code.clone())
            .or_insert_with(|| Room::new(rng))
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn bind(&mut self, client_id: ClientId, code: RoomCode, side: Side) {
        self.connection_rooms.insert(client_id, code);
        self.connection_sides.insert(client_id, side);
    }

    pub fn resolve(&self, client_id: ClientId) -> Option<(RoomCode, Side)> {
        let code = self.connection_rooms.get(&client_id)?;
        let side = self.connection_sides.get(&client_id)?;
        Some((code.clone(), *side))
    }

    pub fn unbind(&mut self, client_id: ClientId) -> Option<(RoomCode, Side)> {
        let code = self.connection_rooms.remove(&client_id)?;
        let side = self.connection_sides.remove(&client_id)?;
        Some((code, side))
    }

    /// Evicts the room if (and only if) both slots are vacant.
    pub fn destroy_if_empty(&mut self, code: &RoomCode) -> bool {
        if self.rooms.get(code).is_some_and(Room::is_empty) {
            self.rooms.remove(code);
            true
        } else {
            false
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn generate_code(&self, rng: &mut StdRng) -> RoomCode {
        loop {
            let code: String = (0..ROOM_CODE_LENGTH)
                .map(|_| {
                    let idx = (rng.next_u32() as usize) % ROOM_CODE_ALPHABET.len();
                    ROOM_CODE_ALPHABET[idx] as char
                })
                .collect();
            let code = RoomCode(code);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}
