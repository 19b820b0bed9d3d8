use colored::*;
use seminar::client::{ConnectionState, RemoteTrack, SessionObserver};
use seminar::{Role, SessionId};
use std::time::Duration;
use tokio::sync::Notify;

/// Prints session activity and remembers when signaling is gone for good.
#[derive(Default)]
pub struct ConsoleObserver {
    lost: Notify,
}

impl ConsoleObserver {
    /// Resolves after a fatal signaling disconnect.
    pub async fn lost(&self) {
        self.lost.notified().await
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_remote_stream(&self, track: &RemoteTrack, peer: &SessionId) {
        println!("{} {} from {}", "stream".cyan(), track.track_id, peer);
    }

    fn on_participant_joined(&self, username: &str, role: Role) {
        println!("{} {} ({})", "joined".green(), username.bold(), role);
    }

    fn on_instructor_stream_available(&self, instructor: &SessionId) {
        println!("{} {}", "instructor live".green().bold(), instructor);
    }

    fn on_screen_share_start(&self) {
        println!("{}", "screen share started".yellow());
    }

    fn on_screen_share_stop(&self) {
        println!("{}", "screen share stopped".yellow());
    }

    fn on_peer_state_changed(&self, peer: &SessionId, state: ConnectionState) {
        let state = match state {
            ConnectionState::Connected => state.to_string().green(),
            ConnectionState::Closed => state.to_string().red(),
            _ => state.to_string().normal(),
        };
        println!("{} {} {}", "peer".dimmed(), peer, state);
    }

    fn on_reconnecting(&self, attempt: u32, delay: Duration) {
        println!(
            "{} attempt {} in {:?}",
            "reconnecting".yellow(),
            attempt,
            delay
        );
    }

    fn on_disconnected(&self, code: u16, reason: &str, fatal: bool) {
        println!("{} code={} {}", "disconnected".red(), code, reason);
        if fatal {
            self.lost.notify_one();
        }
    }
}
