//! Server configuration
//!
//! Every setting has a default and can be overridden through an
//! environment variable:
//!
//! ```text
//! UNIVERSE_LISTEN_ADDR=0.0.0.0:8080
//! UNIVERSE_GRAPH_FILE=graph.json
//! UNIVERSE_POLL_INTERVAL_MS=3000
//! UNIVERSE_QUEUE_CAPACITY=256
//! UNIVERSE_PING_INTERVAL_MS=54000
//! UNIVERSE_READ_TIMEOUT_MS=60000
//! UNIVERSE_WRITE_TIMEOUT_MS=10000
//! UNIVERSE_MAX_MESSAGE_SIZE=512
//! UNIVERSE_COMPARE_AGE=true
//! UNIVERSE_LOG_LEVEL=info
//! ```

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::delta::TrackerOptions;

/// Configuration for the sync server
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub listen_addr: SocketAddr,

    /// Graph file read by the file-backed collector
    pub graph_file: PathBuf,

    /// How often the hub polls the collector while viewers are connected
    pub poll_interval: Duration,

    /// Per-viewer outbound queue length.
    ///
    /// A viewer whose queue is full when an update is fanned out is
    /// dropped, so this bounds how far a slow viewer may fall behind.
    pub queue_capacity: usize,

    /// Interval between keepalive pings sent to each viewer
    pub ping_interval: Duration,

    /// A viewer that sends nothing (not even a pong) for this long is
    /// considered dead. Must exceed `ping_interval`.
    pub read_timeout: Duration,

    /// Deadline for writing a single frame to a viewer
    pub write_timeout: Duration,

    /// Largest inbound frame accepted from a viewer, in bytes
    pub max_message_size: usize,

    /// Whether node age participates in change detection
    pub compare_age: bool,

    /// Log level for the fmt subscriber
    pub log_level: tracing::Level,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            graph_file: PathBuf::from("graph.json"),
            poll_interval: Duration::from_secs(3),
            queue_capacity: 256,
            ping_interval: Duration::from_secs(54),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            max_message_size: 512,
            compare_age: true,
            log_level: tracing::Level::INFO,
        }
    }
}

impl SyncConfig {
    /// Build a config from `UNIVERSE_*` environment variables.
    ///
    /// Unparsable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`SyncConfig::from_env`], but hands the warnings back instead of
    /// logging them, for callers that install a subscriber afterwards.
    pub fn from_env_with_warnings() -> (Self, Vec<String>) {
        Self::load(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, warnings) = Self::load(lookup);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        config
    }

    /// Build a config and collect a message for every value replaced by
    /// its default
    pub fn load<F>(lookup: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut reader = EnvReader {
            lookup,
            warnings: Vec::new(),
        };

        let config = Self {
            listen_addr: reader.parse_or("UNIVERSE_LISTEN_ADDR", defaults.listen_addr),
            graph_file: reader
                .raw("UNIVERSE_GRAPH_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.graph_file),
            poll_interval: reader.millis_or("UNIVERSE_POLL_INTERVAL_MS", defaults.poll_interval),
            queue_capacity: reader.parse_or("UNIVERSE_QUEUE_CAPACITY", defaults.queue_capacity),
            ping_interval: reader.millis_or("UNIVERSE_PING_INTERVAL_MS", defaults.ping_interval),
            read_timeout: reader.millis_or("UNIVERSE_READ_TIMEOUT_MS", defaults.read_timeout),
            write_timeout: reader.millis_or("UNIVERSE_WRITE_TIMEOUT_MS", defaults.write_timeout),
            max_message_size: reader.parse_or("UNIVERSE_MAX_MESSAGE_SIZE", defaults.max_message_size),
            compare_age: reader.parse_or("UNIVERSE_COMPARE_AGE", defaults.compare_age),
            log_level: reader.parse_or("UNIVERSE_LOG_LEVEL", defaults.log_level),
        };

        let mut warnings = reader.warnings;
        let config = config.sanitized(&mut warnings);
        (config, warnings)
    }

    /// Replace values the hub cannot work with by their defaults
    fn sanitized(mut self, warnings: &mut Vec<String>) -> Self {
        let defaults = Self::default();
        if self.queue_capacity == 0 {
            warnings.push(format!(
                "queue capacity must be positive, using {}",
                defaults.queue_capacity
            ));
            self.queue_capacity = defaults.queue_capacity;
        }
        if self.poll_interval.is_zero() {
            warnings.push(format!(
                "poll interval must be positive, using {:?}",
                defaults.poll_interval
            ));
            self.poll_interval = defaults.poll_interval;
        }
        if self.ping_interval.is_zero() {
            warnings.push(format!(
                "ping interval must be positive, using {:?}",
                defaults.ping_interval
            ));
            self.ping_interval = defaults.ping_interval;
        }
        if self.read_timeout <= self.ping_interval {
            let adjusted = self.ping_interval + self.ping_interval / 9;
            warnings.push(format!(
                "read timeout {:?} does not exceed ping interval {:?}, viewers would time out between pings; using {:?}",
                self.read_timeout, self.ping_interval, adjusted
            ));
            self.read_timeout = adjusted;
        }
        self
    }

    /// Per-connection settings derived from this config
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            ping_interval: self.ping_interval,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            max_message_size: self.max_message_size,
        }
    }

    /// Hub settings derived from this config
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            poll_interval: self.poll_interval,
            queue_capacity: self.queue_capacity,
            tracker: TrackerOptions {
                compare_age: self.compare_age,
            },
        }
    }
}

/// Settings for one viewer connection
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub ping_interval: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub max_message_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        SyncConfig::default().connection_config()
    }
}

/// Settings for the broadcast hub
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    pub poll_interval: Duration,
    pub queue_capacity: usize,
    pub tracker: TrackerOptions,
}

impl Default for HubConfig {
    fn default() -> Self {
        SyncConfig::default().hub_config()
    }
}

/// Key lookup that remembers which values it had to discard
struct EnvReader<F> {
    lookup: F,
    warnings: Vec<String>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    /// Parse a variable, falling back to `default` when unset or malformed
    fn parse_or<T: FromStr>(&mut self, key: &str, default: T) -> T {
        match self.raw(key) {
            None => default,
            Some(raw) => match raw.trim().parse() {
                Ok(value) => value,
                Err(_) => {
                    self.warnings.push(format!("ignoring invalid {}={:?}", key, raw));
                    default
                }
            },
        }
    }

    fn millis_or(&mut self, key: &str, default: Duration) -> Duration {
        Duration::from_millis(self.parse_or(key, default.as_millis() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> SyncConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SyncConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.ping_interval, Duration::from_secs(54));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.compare_age);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("UNIVERSE_LISTEN_ADDR", "0.0.0.0:9000"),
            ("UNIVERSE_GRAPH_FILE", "/tmp/cluster.json"),
            ("UNIVERSE_POLL_INTERVAL_MS", "500"),
            ("UNIVERSE_QUEUE_CAPACITY", "8"),
            ("UNIVERSE_COMPARE_AGE", "false"),
            ("UNIVERSE_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.graph_file, PathBuf::from("/tmp/cluster.json"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.queue_capacity, 8);
        assert!(!config.compare_age);
        assert_eq!(config.log_level, tracing::Level::DEBUG);

        let hub = config.hub_config();
        assert_eq!(hub.queue_capacity, 8);
        assert!(!hub.tracker.compare_age);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("UNIVERSE_POLL_INTERVAL_MS", "soon"),
            ("UNIVERSE_QUEUE_CAPACITY", "0"),
        ]);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.queue_capacity, 256);
    }

    #[test]
    fn test_fallbacks_are_reported() {
        let vars: HashMap<&str, &str> = [
            ("UNIVERSE_POLL_INTERVAL_MS", "0"),
            ("UNIVERSE_PING_INTERVAL_MS", "0"),
            ("UNIVERSE_QUEUE_CAPACITY", "lots"),
        ]
        .into_iter()
        .collect();
        let (config, warnings) = SyncConfig::load(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.ping_interval, Duration::from_secs(54));
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("UNIVERSE_QUEUE_CAPACITY"));
        assert!(warnings.iter().any(|w| w.starts_with("poll interval")));
        assert!(warnings.iter().any(|w| w.starts_with("ping interval")));
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let (_, warnings) = SyncConfig::load(|_| None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_read_timeout_exceeds_ping_interval() {
        let config = config_from(&[
            ("UNIVERSE_PING_INTERVAL_MS", "1000"),
            ("UNIVERSE_READ_TIMEOUT_MS", "500"),
        ]);
        assert!(config.read_timeout > config.ping_interval);
    }
}
