use std::fmt;

use bincode::{Decode, Encode};
use glam::Vec2;

// --- MESSAGES ---

/// Messages from Client -> Server
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom { room_code: RoomCode },
    /// Paddle intent for the caller's side of their current room.
    PlayerInput { direction: Direction },
    RestartGame,
}

/// Messages from Server -> Client
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum ServerMessage {
    RoomCreated { room_code: RoomCode },
    PlayerJoined { side: Side },
    GameStarted,
    /// The authoritative full state, no deltas.
    GameStateUpdate { state: GameState },
    GameEnded { winner: Side },
    RoomFull,
    PlayerDisconnected,
}

// --- IDENTIFIERS ---

/// Human-facing code used to share and join rooms. Stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Encode, Decode)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Codes are case-insensitive on entry; the canonical form is uppercase.
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two paddle slots of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Discrete paddle intent, already reduced from raw key events client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Direction {
    Up,
    Down,
    Stop,
}

// --- GAME STATE ---

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Ball {
    #[bincode(with_serde)]
    pub position: Vec2,
    /// Units per tick, not per second.
    #[bincode(with_serde)]
    pub velocity: Vec2,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Paddle {
    pub y: f32,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Paddles {
    pub left: Paddle,
    pub right: Paddle,
}

impl Paddles {
    pub fn side(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Paddle {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// One room's full simulation state. The playfield constants ride along
/// so clients can render without hardcoding them.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct GameState {
    pub ball: Ball,
    pub paddles: Paddles,
    pub game_width: f32,
    pub game_height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub ball_size: f32,
    pub game_started: bool,
    pub game_over: bool,
    pub winner: Option<Side>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_code_normalizes_case_and_whitespace() {
        assert_eq!(RoomCode::normalized("ab12cd"), RoomCode("AB12CD".into()));
        assert_eq!(RoomCode::normalized("  Xy9Z0q "), RoomCode("XY9Z0Q".into()));
    }

    #[test]
    fn side_opponent_flips() {
        assert_eq!(Side::Left.opponent(), Side::Right);
        assert_eq!(Side::Right.opponent(), Side::Left);
    }
}
