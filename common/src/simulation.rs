//! Pure fixed-tick Pong simulation. No I/O, no concurrency awareness;
//! the server owns a `GameState` per room and drives these functions.

use std::f32::consts::FRAC_PI_3;

use glam::Vec2;
use rand::Rng;
use rand::rngs::StdRng;

use crate::protocol::{Ball, Direction, GameState, Paddle, Paddles, Side};

pub const GAME_WIDTH: f32 = 800.0;
pub const GAME_HEIGHT: f32 = 400.0;
pub const PADDLE_WIDTH: f32 = 10.0;
pub const PADDLE_HEIGHT: f32 = 80.0;
pub const BALL_SIZE: f32 = 10.0;
/// Paddle step per input event, units.
pub const PADDLE_SPEED: f32 = 8.0;
/// Ball speed, units per tick. Fixed for the whole match; no rally ramp.
pub const BALL_SPEED: f32 = 5.0;
pub const WINNING_SCORE: u32 = 5;

const SPIN_FACTOR: f32 = 1.5;
/// Post-score serves launch within ±60° of horizontal.
const MAX_SERVE_ANGLE: f32 = FRAC_PI_3;

/// A fresh pre-game state: centered ball with a random serve, centered
/// paddles, zero scores, not yet started.
pub fn initial_state(rng: &mut StdRng) -> GameState {
    let paddle_y = GAME_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;
    let mut state = GameState {
        ball: Ball {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
        },
        paddles: Paddles {
            left: Paddle {
                y: paddle_y,
                score: 0,
            },
            right: Paddle {
                y: paddle_y,
                score: 0,
            },
        },
        game_width: GAME_WIDTH,
        game_height: GAME_HEIGHT,
        paddle_width: PADDLE_WIDTH,
        paddle_height: PADDLE_HEIGHT,
        ball_size: BALL_SIZE,
        game_started: false,
        game_over: false,
        winner: None,
    };
    launch_ball(&mut state, rng);
    state
}

/// Re-centers the ball and serves in a random direction. Used when a
/// rally begins (game start and restart), not after a point.
pub fn launch_ball(state: &mut GameState, rng: &mut StdRng) {
    state.ball.position = Vec2::new(state.game_width / 2.0, state.game_height / 2.0);
    let dx = if rng.random_bool(0.5) {
        BALL_SPEED
    } else {
        -BALL_SPEED
    };
    let dy = (rng.random::<f32>() - 0.5) * BALL_SPEED;
    state.ball.velocity = Vec2::new(dx, dy);
}

/// Applies one discrete paddle intent. `Stop` does not move the paddle;
/// positions step per input event rather than integrating a velocity.
pub fn apply_input(state: &mut GameState, side: Side, direction: Direction) {
    let limit = state.game_height - state.paddle_height;
    let paddle = state.paddles.side_mut(side);
    match direction {
        Direction::Up => paddle.y = (paddle.y - PADDLE_SPEED).max(0.0),
        Direction::Down => paddle.y = (paddle.y + PADDLE_SPEED).min(limit),
        Direction::Stop => {}
    }
}

/// Advances the ball by one tick: integration, wall bounces, paddle
/// collisions, scoring and the win check, in that order. Returns true
/// exactly when this tick ended the game. No-op unless the game is in
/// progress.
pub fn advance(state: &mut GameState, rng: &mut StdRng) -> bool {
    if !state.game_started || state.game_over {
        return false;
    }

    state.ball.position += state.ball.velocity;

    // Bounce off top and bottom walls.
    let max_y = state.game_height - state.ball_size;
    if state.ball.position.y <= 0.0 || state.ball.position.y >= max_y {
        state.ball.velocity.y = -state.ball.velocity.y;
        state.ball.position.y = state.ball.position.y.clamp(0.0, max_y);
    }

    // Left paddle. The dx < 0 guard prevents re-triggering while the
    // ball recedes from the paddle face.
    if state.ball.position.x <= state.paddle_width
        && state.ball.position.y + state.ball_size >= state.paddles.left.y
        && state.ball.position.y <= state.paddles.left.y + state.paddle_height
        && state.ball.velocity.x < 0.0
    {
        state.ball.velocity.x = state.ball.velocity.x.abs();
        state.ball.position.x = state.paddle_width;
        state.ball.velocity.y = spin(state, state.paddles.left.y);
    }

    // Right paddle, mirrored.
    if state.ball.position.x + state.ball_size >= state.game_width - state.paddle_width
        && state.ball.position.y + state.ball_size >= state.paddles.right.y
        && state.ball.position.y <= state.paddles.right.y + state.paddle_height
        && state.ball.velocity.x > 0.0
    {
        state.ball.velocity.x = -state.ball.velocity.x.abs();
        state.ball.position.x = state.game_width - state.paddle_width - state.ball_size;
        state.ball.velocity.y = spin(state, state.paddles.right.y);
    }

    // Scoring: the ball fully crossed a goal line. The conceding side
    // receives the next serve.
    if state.ball.position.x < 0.0 {
        state.paddles.right.score += 1;
        reset_ball(state, Side::Left, rng);
        return check_win(state);
    }
    if state.ball.position.x > state.game_width {
        state.paddles.left.score += 1;
        reset_ball(state, Side::Right, rng);
        return check_win(state);
    }

    false
}

/// Rebound steepness from where the ball's centre hit the paddle:
/// 0 = top edge, 1 = bottom edge, 0.5 = dead centre (flat return).
fn spin(state: &GameState, paddle_y: f32) -> f32 {
    let centre = state.ball.position.y + state.ball_size / 2.0;
    let hit_fraction = ((centre - paddle_y) / state.paddle_height).clamp(0.0, 1.0);
    (hit_fraction - 0.5) * BALL_SPEED * SPIN_FACTOR
}

fn reset_ball(state: &mut GameState, toward: Side, rng: &mut StdRng) {
    state.ball.position = Vec2::new(state.game_width / 2.0, state.game_height / 2.0);
    let angle = (rng.random::<f32>() - 0.5) * 2.0 * MAX_SERVE_ANGLE;
    let direction = match toward {
        Side::Left => -1.0,
        Side::Right => 1.0,
    };
    state.ball.velocity = Vec2::new(
        angle.cos() * BALL_SPEED * direction,
        angle.sin() * BALL_SPEED,
    );
}

fn check_win(state: &mut GameState) -> bool {
    if state.paddles.left.score >= WINNING_SCORE {
        state.game_over = true;
        state.winner = Some(Side::Left);
        return true;
    }
    if state.paddles.right.score >= WINNING_SCORE {
        state.game_over = true;
        state.winner = Some(Side::Right);
        return true;
    }
    false
}
