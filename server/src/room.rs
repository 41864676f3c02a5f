use std::time::Instant;

use common::protocol::{Direction, GameState, Side};
use common::simulation;
use rand::rngs::StdRng;
use renet::ClientId;

/// One isolated two-player session: two optional paddle slots and the
/// authoritative `GameState` they play on. Rooms never touch the
/// transport; the logic layer turns their state into outbound events.
pub struct Room {
    left: Option<ClientId>,
    right: Option<ClientId>,
    state: GameState,
    last_update: Instant,
}

impl Room {
    pub fn new(rng: &mut StdRng) -> Self {
        Self {
            left: None,
            right: None,
            state: simulation::initial_state(rng),
            last_update: Instant::now(),
        }
    }

    /// Assigns the first vacant side, left before right. Returns `None`
    /// when both slots are occupied; the room is left untouched.
    pub fn add_player(&mut self, client_id: ClientId) -> Option<Side> {
        if self.left.is_none() {
            self.left = Some(client_id);
            return Some(Side::Left);
        }
        if self.right.is_none() {
            self.right = Some(client_id);
            return Some(Side::Right);
        }
        None
    }

    /// Clears whichever slot holds `client_id`, returning its side.
    pub fn remove_player(&mut self, client_id: ClientId) -> Option<Side> {
        if self.left == Some(client_id) {
            self.left = None;
            return Some(Side::Left);
        }
        if self.right == Some(client_id) {
            self.right = None;
            return Some(Side::Right);
        }
        None
    }

    pub fn side_of(&self, client_id: ClientId) -> Option<Side> {
        if self.left == Some(client_id) {
            Some(Side::Left)
        } else if self.right == Some(client_id) {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn occupants(&self) -> Vec<ClientId> {
        self.left.iter().chain(self.right.iter()).copied().collect()
    }

    pub fn is_full(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// A room only simulates while both slots are occupied and the
    /// rally is neither unstarted nor decided.
    pub fn is_playing(&self) -> bool {
        self.is_full() && self.state.game_started && !self.state.game_over
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    /// Flips the room into Playing with a fresh serve. Scores are
    /// already zero here: the room was either brand new or reset by
    /// `reset_to_waiting` when its previous opponent left.
    pub fn start_game(&mut self, rng: &mut StdRng) {
        self.state.game_started = true;
        self.state.game_over = false;
        self.state.winner = None;
        simulation::launch_ball(&mut self.state, rng);
        self.last_update = Instant::now();
    }

    /// Full reinitialization forced straight into Playing; used by the
    /// restart request when both players stay seated after a game.
    pub fn restart(&mut self, rng: &mut StdRng) {
        self.state = simulation::initial_state(rng);
        self.state.game_started = true;
        self.last_update = Instant::now();
    }

    /// Drops back to WaitingForOpponent after a mid-game disconnect:
    /// fresh ball and zeroed scores so the next pairing starts 0-0.
    pub fn reset_to_waiting(&mut self, rng: &mut StdRng) {
        self.state = simulation::initial_state(rng);
        self.last_update = Instant::now();
    }

    /// Applies a paddle intent for `side`. Returns false (leaving the
    /// state untouched) when the game is not in progress.
    pub fn apply_input(&mut self, side: Side, direction: Direction) -> bool {
        if !self.state.game_started || self.state.game_over {
            return false;
        }
        simulation::apply_input(&mut self.state, side, direction);
        self.last_update = Instant::now();
        true
    }

    /// One simulation tick. Returns true when this tick ended the game.
    pub fn advance(&mut self, rng: &mut StdRng) -> bool {
        let ended = simulation::advance(&mut self.state, rng);
        self.last_update = Instant::now();
        ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[test]
    fn players_fill_left_then_right() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        assert!(room.is_empty());

        assert_eq!(room.add_player(1), Some(Side::Left));
        assert!(!room.is_full());
        assert_eq!(room.add_player(2), Some(Side::Right));
        assert!(room.is_full());

        assert_eq!(room.side_of(1), Some(Side::Left));
        assert_eq!(room.side_of(2), Some(Side::Right));
        assert_eq!(room.occupants(), vec![1, 2]);
    }

    #[test]
    fn third_player_is_rejected_without_side_effects() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        room.add_player(2);

        assert_eq!(room.add_player(3), None);
        assert_eq!(room.side_of(3), None);
        assert_eq!(room.occupants(), vec![1, 2]);
    }

    #[test]
    fn removing_one_of_two_reopens_the_side() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        room.add_player(2);

        assert_eq!(room.remove_player(1), Some(Side::Left));
        assert!(!room.is_empty());
        assert!(!room.is_full());

        // A newcomer takes the vacated left slot.
        assert_eq!(room.add_player(3), Some(Side::Left));
    }

    #[test]
    fn removing_the_sole_occupant_empties_the_room() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        assert_eq!(room.remove_player(1), Some(Side::Left));
        assert!(room.is_empty());
        assert_eq!(room.remove_player(1), None);
    }

    #[test]
    fn start_game_makes_the_room_playable() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        room.add_player(2);
        assert!(!room.is_playing());

        room.start_game(&mut rng);
        assert!(room.is_playing());
        assert!(room.state().game_started);
        assert!(!room.state().game_over);
    }

    #[test]
    fn input_is_ignored_unless_playing() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);

        let y_before = room.state().paddles.left.y;
        assert!(!room.apply_input(Side::Left, Direction::Up));
        assert_eq!(room.state().paddles.left.y, y_before);

        room.add_player(2);
        room.start_game(&mut rng);
        assert!(room.apply_input(Side::Left, Direction::Up));
        assert_eq!(room.state().paddles.left.y, y_before - 8.0);
    }

    #[test]
    fn restart_zeroes_scores_and_forces_playing() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        room.add_player(2);
        room.start_game(&mut rng);

        room.state_mut().paddles.left.score = 5;
        room.state_mut().game_over = true;
        room.state_mut().winner = Some(Side::Left);

        room.restart(&mut rng);
        assert!(room.is_playing());
        assert_eq!(room.state().paddles.left.score, 0);
        assert_eq!(room.state().winner, None);
    }

    #[test]
    fn reset_to_waiting_reinitializes_state() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        room.add_player(2);
        room.start_game(&mut rng);
        room.state_mut().paddles.right.score = 3;

        room.remove_player(2);
        room.reset_to_waiting(&mut rng);
        assert!(!room.state().game_started);
        assert_eq!(room.state().paddles.right.score, 0);
        assert!(!room.is_playing());
    }

    #[test]
    fn advance_moves_the_ball_while_playing() {
        let mut rng = rng();
        let mut room = Room::new(&mut rng);
        room.add_player(1);
        room.add_player(2);
        room.start_game(&mut rng);

        let before = room.state().ball.position;
        assert!(!room.advance(&mut rng));
        assert_ne!(room.state().ball.position, before);
    }
}
