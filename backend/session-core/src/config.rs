//! Environment-driven configuration for the session core.
//!
//! Everything here has a working default; configuration only overrides. A
//! `.env` file is honored for development setups. Invalid values log a
//! warning and fall back to the default rather than failing startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};

pub const ENV_RUNTIME_DIR: &str = "CFX_RUNTIME_DIR";
pub const ENV_UPDATE_CHANNEL: &str = "CFX_UPDATE_CHANNEL";
pub const ENV_TEARDOWN_TIMEOUT_SECS: &str = "CFX_TEARDOWN_TIMEOUT_SECS";
pub const ENV_FRAME_INTERVAL_MS: &str = "CFX_FRAME_INTERVAL_MS";

const DEFAULT_UPDATE_CHANNEL: &str = "production";
const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Runtime configuration shared by the coordinator and the shell.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory holding the instance lock and channel sockets.
    pub runtime_dir: PathBuf,

    /// Build channel this executable updates from ("production" unless a
    /// build switch relaunch selected another).
    pub update_channel: String,

    /// Upper bound on how long a deferred connect waits for session
    /// teardown before the attempt is abandoned.
    pub teardown_timeout: Duration,

    /// Cadence of the frame-driven poller.
    pub frame_interval: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            runtime_dir: default_runtime_dir(),
            update_channel: DEFAULT_UPDATE_CHANNEL.to_string(),
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl CoreConfig {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file first if one exists, then applies any
    /// `CFX_`-prefixed overrides on top of the defaults. Never fails:
    /// unset variables keep their defaults and unparsable values warn and
    /// keep their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(dir) = env::var(ENV_RUNTIME_DIR) {
            if dir.is_empty() {
                warn!("Ignoring empty {ENV_RUNTIME_DIR}");
            } else {
                config.runtime_dir = PathBuf::from(dir);
            }
        }

        if let Ok(channel) = env::var(ENV_UPDATE_CHANNEL) {
            if channel.is_empty() {
                warn!("Ignoring empty {ENV_UPDATE_CHANNEL}");
            } else {
                config.update_channel = channel;
            }
        }

        config.teardown_timeout = duration_from_env(
            ENV_TEARDOWN_TIMEOUT_SECS,
            Duration::from_secs,
            DEFAULT_TEARDOWN_TIMEOUT,
        );
        config.frame_interval = duration_from_env(
            ENV_FRAME_INTERVAL_MS,
            Duration::from_millis,
            DEFAULT_FRAME_INTERVAL,
        );

        debug!(
            "Config loaded: runtime_dir={}, update_channel={}, teardown_timeout={:?}, frame_interval={:?}",
            config.runtime_dir.display(),
            config.update_channel,
            config.teardown_timeout,
            config.frame_interval,
        );

        config
    }
}

/// Platform runtime directory, falling back to the temp directory on
/// systems without one.
fn default_runtime_dir() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(env::temp_dir)
}

/// Parse a positive integer duration variable. Zero is rejected: a zero
/// frame interval would spin and a zero teardown timeout would abandon
/// every deferred connect immediately.
fn duration_from_env(var: &str, build: fn(u64) -> Duration, default: Duration) -> Duration {
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => build(value),
            _ => {
                warn!("Invalid {var} value {raw:?}, using default");
                default
            }
        },
        Err(_) => default,
    }
}
