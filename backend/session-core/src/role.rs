//! Instance role resolution.
//!
//! Exactly one interactive primary may run per user. A pidfile in the
//! runtime directory arbitrates: whoever creates it is the primary, and
//! every later invocation becomes a satellite that forwards its launch
//! request over the message channels and exits.
//!
//! A crashed primary leaves its pidfile behind; the recorded PID is probed
//! against the process table and a dead holder's file is removed so the
//! next invocation can claim the primary role.

use crate::APP_IDENT;
use crate::error::role::RoleError;

use common::ErrorLocation;

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process;

use const_format::concatcp;
use log::{debug, info, warn};
use sysinfo::{Pid, ProcessesToUpdate, System};

const LOCK_FILE_NAME: &str = concatcp!(APP_IDENT, ".pid");

/// Which kind of process this invocation is.
pub enum InstanceRole {
    /// The single interactive instance; holds the lock until exit.
    Primary(RoleGuard),

    /// A forwarding instance; another primary is already running.
    Satellite,
}

/// Removes the instance lock when the primary exits.
pub struct RoleGuard {
    path: PathBuf,
}

impl Drop for RoleGuard {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            if error.kind() != ErrorKind::NotFound {
                warn!(
                    "Failed to remove instance lock {}: {}",
                    self.path.display(),
                    error
                );
            }
        }
    }
}

/// Decide whether this process is the primary or a satellite.
///
/// Atomically creates the pidfile to claim the primary role. An existing
/// file is probed: a live holder makes this process a satellite, a stale
/// one is removed and the claim retried once. Losing the retry race means
/// another invocation claimed primary first, which is a valid satellite
/// outcome.
///
/// # Errors
///
/// Returns [`RoleError`] when the pidfile cannot be created or removed for
/// reasons other than the arbitration itself.
pub fn resolve(runtime_dir: &Path) -> Result<InstanceRole, RoleError> {
    let lock_path = runtime_dir.join(LOCK_FILE_NAME);

    for _ in 0..2 {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                write!(file, "{}", process::id()).map_err(|error| RoleError::Lock {
                    message: format!(
                        "Failed to write pid to {}: {}",
                        lock_path.display(),
                        error
                    ),
                    location: ErrorLocation::from(Location::caller()),
                })?;
                info!(
                    "Instance lock {} acquired, running as primary",
                    lock_path.display()
                );
                return Ok(InstanceRole::Primary(RoleGuard { path: lock_path }));
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                if lock_holder_alive(&lock_path) {
                    info!("Primary instance already running, acting as satellite");
                    return Ok(InstanceRole::Satellite);
                }

                info!("Removing stale instance lock {}", lock_path.display());
                if let Err(error) = fs::remove_file(&lock_path) {
                    if error.kind() != ErrorKind::NotFound {
                        return Err(error.into());
                    }
                }
            }
            Err(error) => return Err(error.into()),
        }
    }

    debug!("Lost the instance lock race, acting as satellite");
    Ok(InstanceRole::Satellite)
}

/// Whether the process recorded in the pidfile is still alive.
///
/// An unreadable or unparsable file counts as dead: it cannot belong to a
/// healthy primary.
fn lock_holder_alive(lock_path: &Path) -> bool {
    let contents = match fs::read_to_string(lock_path) {
        Ok(contents) => contents,
        Err(_) => return false,
    };

    let pid = match contents.trim().parse::<u32>() {
        Ok(pid) => pid,
        Err(_) => return false,
    };

    let mut system = System::new_all();
    system.refresh_processes(ProcessesToUpdate::All, true);
    system.process(Pid::from_u32(pid)).is_some()
}
