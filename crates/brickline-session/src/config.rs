use std::time::Duration;

/// Default bound on a single request/reply exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the change stream.
pub const DEFAULT_EVENT_BUFFER: usize = 16;

/// Session behavior knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for a correlated reply. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Emit a snapshot after every poll round, changed or not.
    pub always_notify: bool,
    /// Send "stop all motors" on connect and after every poll round.
    pub safety_stop: bool,
    /// Snapshots buffered before the poller waits on the consumer.
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            always_notify: false,
            safety_stop: true,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SessionConfig {
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_always_notify(mut self, always_notify: bool) -> Self {
        self.always_notify = always_notify;
        self
    }

    pub fn with_safety_stop(mut self, safety_stop: bool) -> Self {
        self.safety_stop = safety_stop;
        self
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer.max(1);
        self
    }
}
