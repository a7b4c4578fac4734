//! Build-switch relaunch.
//!
//! Some servers require a game build other than the one this executable
//! was built from. Recovering means replacing the whole process: spawn the
//! current executable with flags telling the successor to switch build
//! channels and reconnect, then exit with [`BUILD_SWITCH_EXIT_CODE`] so
//! the updater wrapping us knows to swap binaries first.

use crate::error::relaunch::RelaunchError;
use crate::launch::{CONNECT_FLAG, SWITCH_BUILD_FLAG};

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::process::Command;

use log::info;

/// Exit status signalling "restarting for a build switch" to the updater.
pub const BUILD_SWITCH_EXIT_CODE: i32 = 105;

/// Spawn the successor process for a build switch.
///
/// The successor receives `--switch-build --connect <target>` and runs the
/// normal launch path; the caller should exit with
/// [`BUILD_SWITCH_EXIT_CODE`] once this returns. The instance lock must be
/// released before calling, or the successor will resolve as a satellite
/// of a primary that is about to die.
///
/// # Errors
///
/// Returns [`RelaunchError::ExecutablePath`] when the current executable
/// cannot be located and [`RelaunchError::Spawn`] when the successor fails
/// to start.
pub fn spawn_build_switch(target: &str) -> Result<u32, RelaunchError> {
    let executable = env::current_exe().map_err(|error| RelaunchError::ExecutablePath {
        message: format!("Failed to locate current executable: {error}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let child = Command::new(&executable)
        .arg(SWITCH_BUILD_FLAG)
        .arg(CONNECT_FLAG)
        .arg(target)
        .spawn()
        .map_err(|error| RelaunchError::Spawn {
            message: format!("Failed to relaunch {}: {}", executable.display(), error),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!(
        "Relaunching as PID {} for a build switch targeting {target}",
        child.id()
    );
    Ok(child.id())
}
