pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Path prefix under which the relay exposes one WebSocket endpoint per seminar.
pub const LIVE_STREAM_PATH: &str = "/ws/live-stream";

/// Close code of an intentional, orderly WebSocket shutdown.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when a socket went away without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported when a close frame carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;
