//! Local message channels between satellite launches and the primary
//! instance.
//!
//! Two independent one-directional queues carry forwarded launch requests:
//! one for connect targets, one for auth payloads. Each is a Unix datagram
//! socket bound to a well-known name in the runtime directory, so a
//! satellite can address the primary without any discovery step.
//!
//! # Delivery contract
//!
//! - `send` is fire-and-forget: if no primary is listening the message is
//!   dropped silently. Satellites only exist because a primary was
//!   confirmed running, so a missing listener means it exited between
//!   launch and send, and there is nobody left to act on the request.
//! - `try_receive` never blocks and drains at most one message.
//! - Zero-length datagrams are liveness probes, not messages; receivers
//!   skip them.

use crate::APP_IDENT;
use crate::error::channel::ChannelError;

use common::ErrorLocation;

use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixDatagram;
use std::panic::Location;
use std::path::{Path, PathBuf};

use const_format::concatcp;
use log::{debug, info, warn};

const CONNECT_SOCKET_NAME: &str = concatcp!(APP_IDENT, "_connect.sock");
const AUTH_SOCKET_NAME: &str = concatcp!(APP_IDENT, "_auth.sock");

/// Largest accepted datagram. Connect targets and auth payloads are tiny;
/// anything bigger is malformed input.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// The two queue kinds, each with its own socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Connect,
    Auth,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Connect => "connect",
            MessageKind::Auth => "auth",
        }
    }

    fn socket_name(&self) -> &'static str {
        match self {
            MessageKind::Connect => CONNECT_SOCKET_NAME,
            MessageKind::Auth => AUTH_SOCKET_NAME,
        }
    }

    fn socket_path(&self, runtime_dir: &Path) -> PathBuf {
        runtime_dir.join(self.socket_name())
    }
}

/// Receiving end of one queue kind. Held only by the primary instance.
pub struct MessageChannel {
    kind: MessageKind,
    socket: UnixDatagram,
    path: PathBuf,
}

impl MessageChannel {
    /// Bind the receiving socket for `kind` in `runtime_dir`.
    ///
    /// A leftover socket file from a crashed primary is detected by
    /// probing it: if nothing answers, the file is removed and the bind
    /// retried. If a live process answers, the caller is not the primary
    /// and binding fails with [`ChannelError::AlreadyBound`].
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::AlreadyBound`] if another live process owns
    /// the socket, or [`ChannelError::Bind`] / [`ChannelError::Io`] for
    /// filesystem and socket failures.
    pub fn bind(runtime_dir: &Path, kind: MessageKind) -> Result<Self, ChannelError> {
        let path = kind.socket_path(runtime_dir);

        match UnixDatagram::bind(&path) {
            Ok(socket) => Self::finish_bind(kind, socket, path),
            Err(error) if error.kind() == ErrorKind::AddrInUse => {
                if occupant_alive(&path) {
                    return Err(ChannelError::AlreadyBound {
                        message: format!(
                            "{} channel at {} is owned by a live process",
                            kind.as_str(),
                            path.display()
                        ),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }

                info!(
                    "Removing stale {} channel socket at {}",
                    kind.as_str(),
                    path.display()
                );
                fs::remove_file(&path)?;

                let socket = UnixDatagram::bind(&path).map_err(|e| ChannelError::Bind {
                    message: format!("Failed to rebind {}: {}", path.display(), e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
                Self::finish_bind(kind, socket, path)
            }
            Err(error) => Err(ChannelError::Bind {
                message: format!("Failed to bind {}: {}", path.display(), error),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn finish_bind(
        kind: MessageKind,
        socket: UnixDatagram,
        path: PathBuf,
    ) -> Result<Self, ChannelError> {
        socket.set_nonblocking(true)?;
        debug!("Bound {} channel at {}", kind.as_str(), path.display());
        Ok(Self { kind, socket, path })
    }

    /// Drain at most one message without blocking.
    ///
    /// Returns `Ok(None)` when the queue is empty. Zero-length datagrams
    /// (liveness probes) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] for socket failures other than an
    /// empty queue.
    pub fn try_receive(&self) -> Result<Option<Vec<u8>>, ChannelError> {
        let mut buffer = vec![0u8; MAX_MESSAGE_BYTES];
        loop {
            match self.socket.recv(&mut buffer) {
                Ok(0) => continue,
                Ok(received) => return Ok(Some(buffer[..received].to_vec())),
                Err(error) if error.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Send one message to whichever primary owns the `kind` queue.
    ///
    /// Fire-and-forget: a missing or unreachable listener is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Oversized`] for messages above
    /// [`MAX_MESSAGE_BYTES`], or [`ChannelError::Io`] for unexpected
    /// socket failures.
    pub fn send(runtime_dir: &Path, kind: MessageKind, bytes: &[u8]) -> Result<(), ChannelError> {
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(ChannelError::Oversized {
                message: format!(
                    "{} message of {} bytes exceeds the {} byte limit",
                    kind.as_str(),
                    bytes.len(),
                    MAX_MESSAGE_BYTES
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if bytes.is_empty() {
            debug!("Skipping empty {} message", kind.as_str());
            return Ok(());
        }

        let path = kind.socket_path(runtime_dir);
        let socket = UnixDatagram::unbound()?;

        match socket.send_to(bytes, &path) {
            Ok(_) => {
                debug!("Forwarded {} message ({} bytes)", kind.as_str(), bytes.len());
                Ok(())
            }
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::NotFound | ErrorKind::ConnectionRefused
                ) =>
            {
                debug!(
                    "No {} listener at {}, message dropped",
                    kind.as_str(),
                    path.display()
                );
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

impl Drop for MessageChannel {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            if error.kind() != ErrorKind::NotFound {
                warn!(
                    "Failed to remove {} channel socket {}: {}",
                    self.kind.as_str(),
                    self.path.display(),
                    error
                );
            }
        }
    }
}

/// Both queues, bound together by the primary.
pub struct MessageChannels {
    pub connect: MessageChannel,
    pub auth: MessageChannel,
}

impl MessageChannels {
    /// Bind the connect and auth queues in `runtime_dir`.
    ///
    /// # Errors
    ///
    /// Fails with the first [`ChannelError`] either bind produces.
    pub fn bind(runtime_dir: &Path) -> Result<Self, ChannelError> {
        let connect = MessageChannel::bind(runtime_dir, MessageKind::Connect)?;
        let auth = MessageChannel::bind(runtime_dir, MessageKind::Auth)?;
        Ok(Self { connect, auth })
    }
}

/// Whether a process is still reading from the socket at `path`.
///
/// Sends a zero-length probe datagram: delivery means a live listener,
/// refusal means a stale file.
fn occupant_alive(path: &Path) -> bool {
    let probe = match UnixDatagram::unbound() {
        Ok(socket) => socket,
        Err(_) => return false,
    };
    probe.send_to(&[], path).is_ok()
}
