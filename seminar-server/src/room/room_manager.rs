use crate::room::{RoomCommand, SeminarRoom};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use seminar_core::SeminarId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

const ROOM_COMMAND_CAPACITY: usize = 100;

struct RoomEntry {
    sender: mpsc::Sender<RoomCommand>,
    members: usize,
}

/// Spawns one [`SeminarRoom`] per seminar id and forgets it once its last
/// socket leaves.
#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<SeminarId, RoomEntry>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more socket for `seminar_id` and return the room's
    /// command sender, creating the room if needed.
    pub fn enter(&self, seminar_id: &SeminarId) -> mpsc::Sender<RoomCommand> {
        let mut entry = self.rooms.entry(seminar_id.clone()).or_insert_with(|| {
            info!(seminar = %seminar_id, "Creating new room");
            let (tx, rx) = mpsc::channel(ROOM_COMMAND_CAPACITY);
            tokio::spawn(SeminarRoom::new(seminar_id.clone(), rx).run());
            RoomEntry {
                sender: tx,
                members: 0,
            }
        });

        entry.members += 1;
        entry.sender.clone()
    }

    /// Counterpart of [`enter`](Self::enter). The room task ends once the
    /// departing handlers drop their senders.
    pub fn leave(&self, seminar_id: &SeminarId) {
        let Entry::Occupied(mut entry) = self.rooms.entry(seminar_id.clone()) else {
            return;
        };

        let room = entry.get_mut();
        room.members = room.members.saturating_sub(1);
        if room.members == 0 {
            entry.remove();
            info!(seminar = %seminar_id, "Last participant left, dropping room");
        }
    }

    pub fn contains(&self, seminar_id: &SeminarId) -> bool {
        self.rooms.contains_key(seminar_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
