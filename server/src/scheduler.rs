use std::collections::HashMap;
use std::time::Duration;

use common::protocol::RoomCode;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// 60 Hz simulation rate.
pub const TICK_INTERVAL: Duration = Duration::from_micros(16_667);

/// One cancellable repeating timer per active room. Each task only
/// pushes the room code into the main loop's channel, so every room
/// mutation still happens on the event-loop task, run to completion.
pub struct LoopScheduler {
    tick_tx: UnboundedSender<RoomCode>,
    handles: HashMap<RoomCode, JoinHandle<()>>,
}

impl LoopScheduler {
    pub fn new(tick_tx: UnboundedSender<RoomCode>) -> Self {
        Self {
            tick_tx,
            handles: HashMap::new(),
        }
    }

    /// Starts the loop for `room_code`. Idempotent: an already-running
    /// loop is aborted and replaced so a room is never double-ticked.
    pub fn start(&mut self, room_code: RoomCode) {
        self.stop(&room_code);

        let tx = self.tick_tx.clone();
        let code = room_code.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(code.clone()).is_err() {
                    break;
                }
            }
        });
        self.handles.insert(room_code, handle);
    }

    pub fn stop(&mut self, room_code: &RoomCode) -> bool {
        if let Some(handle) = self.handles.remove(room_code) {
            handle.abort();
            true
        } else {
            false
        }
    }

    pub fn is_running(&self, room_code: &RoomCode) -> bool {
        self.handles.contains_key(room_code)
    }
}

impl Drop for LoopScheduler {
    fn drop(&mut self) {
        for handle in self.handles.values() {
            handle.abort();
        }
    }
}
