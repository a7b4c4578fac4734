use citizen::host::ForegroundBroker;
use citizen::logger::initialize as LoggerInitialize;
use citizen::shell::{self, ShellOutcome};

use session_core::channel::{MessageChannel, MessageChannels, MessageKind};
use session_core::config::CoreConfig;
use session_core::host::WindowHandoff;
use session_core::launch::{self, LaunchRequest};
use session_core::relaunch::{self, BUILD_SWITCH_EXIT_CODE};
use session_core::role::{self, InstanceRole, RoleGuard};

use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use log::{error, info};

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let log_dir = log_directory();
    if let Err(error) = create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {error}", log_dir.display());
        return 1;
    }
    if let Err(error) = LoggerInitialize(&log_dir) {
        eprintln!("Failed to initialize logger: {error}");
        return 1;
    }

    info!("Citizen shell starting");
    info!("Log directory: {}", log_dir.display());

    let config = CoreConfig::from_env();
    if let Err(error) = create_dir_all(&config.runtime_dir) {
        error!(
            "Failed to create runtime directory {}: {error}",
            config.runtime_dir.display()
        );
        return 1;
    }

    let arguments: Vec<String> = env::args().skip(1).collect();
    let request = launch::parse_arguments(&arguments);
    if launch::has_switch_build_flag(&arguments) {
        info!(
            "Resumed after a build switch on channel {}",
            config.update_channel
        );
    }

    match role::resolve(&config.runtime_dir) {
        Ok(InstanceRole::Primary(guard)) => primary_exit_code(guard, &config, request),
        Ok(InstanceRole::Satellite) => satellite_exit_code(&config, request),
        Err(error) => {
            error!("Failed to resolve the instance role: {error}");
            1
        }
    }
}

fn primary_exit_code(guard: RoleGuard, config: &CoreConfig, request: Option<LaunchRequest>) -> i32 {
    let channels = match MessageChannels::bind(&config.runtime_dir) {
        Ok(channels) => channels,
        Err(error) => {
            error!("Failed to bind message channels: {error}");
            return 1;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("Failed to start the async runtime: {error}");
            return 1;
        }
    };

    let outcome = runtime.block_on(shell::run_primary(channels, config, request));

    // The console's stdin read never completes; bound the shutdown wait
    // instead of joining it. The channel sockets are dropped within this
    // window, so a successor can bind them cleanly.
    runtime.shutdown_timeout(Duration::from_millis(250));

    match outcome {
        ShellOutcome::Exit => {
            info!("Citizen shell exiting");
            0
        }
        ShellOutcome::SwitchBuild { target } => {
            // The successor must find the instance lock released.
            drop(guard);
            match relaunch::spawn_build_switch(&target) {
                Ok(_) => BUILD_SWITCH_EXIT_CODE,
                Err(error) => {
                    error!("Build-switch relaunch failed: {error}");
                    1
                }
            }
        }
    }
}

fn satellite_exit_code(config: &CoreConfig, request: Option<LaunchRequest>) -> i32 {
    let Some(request) = request else {
        info!("Another instance is already running");
        ForegroundBroker.yield_to_primary();
        return 0;
    };

    let (kind, bytes) = match &request {
        LaunchRequest::Connect { target } => (MessageKind::Connect, target.as_bytes()),
        LaunchRequest::AuthPayload { payload } => (MessageKind::Auth, payload.as_bytes()),
    };

    match MessageChannel::send(&config.runtime_dir, kind, bytes) {
        Ok(()) => {
            info!("Forwarded the {} request to the running instance", kind.as_str());
            ForegroundBroker.yield_to_primary();
            0
        }
        Err(error) => {
            error!("Failed to forward the {} request: {error}", kind.as_str());
            1
        }
    }
}

/// Platform log directory, beside the rest of the CitizenFX data.
fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("CitizenFX")
        .join("logs")
}
