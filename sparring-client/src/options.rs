use std::time::Duration;

/// Tuning applied to every connection of a run.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub keepalive: Duration,
    /// Re-send the current outbound message on every keepalive tick.
    pub resend_on_keepalive: bool,
    pub read_buffer_size: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            keepalive: Duration::from_secs(5),
            resend_on_keepalive: false,
            read_buffer_size: 128,
        }
    }
}
