//! Launch-request parsing for URI-scheme and command-line invocations.
//!
//! The OS hands every `fivem:` URI activation to a fresh process; whether
//! that process acts on the request itself (primary) or forwards it
//! (satellite) is decided later by role resolution. Supported forms:
//!
//! - `fivem://connect/<addr>` connects to `<addr>`; the remainder of the
//!   path may itself contain slashes (join URLs do).
//! - `fivem://accept-auth?<query>` carries an auth payload in the raw
//!   query string.
//! - `--connect <addr>` is the flag form used by build-switch relaunches.

use crate::error::launch::LaunchError;
use crate::{SCHEME_PREFIX, URI_SCHEME};

use common::ErrorLocation;

use std::panic::Location;

use log::warn;
use url::Url;

pub const CONNECT_FLAG: &str = "--connect";
pub const SWITCH_BUILD_FLAG: &str = "--switch-build";

const CONNECT_ACTION: &str = "connect";
const ACCEPT_AUTH_ACTION: &str = "accept-auth";

/// One parsed launch intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    Connect { target: String },
    AuthPayload { payload: String },
}

/// Scan command-line arguments for a launch request; first match wins.
///
/// Malformed URIs are logged and skipped rather than aborting the scan, so
/// a bad argument never masks a later valid one.
pub fn parse_arguments(arguments: &[String]) -> Option<LaunchRequest> {
    let mut iter = arguments.iter();

    while let Some(argument) = iter.next() {
        if argument.to_ascii_lowercase().starts_with(SCHEME_PREFIX) {
            match parse_uri(argument) {
                Ok(request) => return Some(request),
                Err(error) => warn!("Ignoring malformed launch URI: {error}"),
            }
            continue;
        }

        if argument == CONNECT_FLAG {
            match iter.next() {
                Some(target) if !target.is_empty() => {
                    return Some(LaunchRequest::Connect {
                        target: target.clone(),
                    });
                }
                _ => warn!("{CONNECT_FLAG} given without a target, ignoring"),
            }
        }
    }

    None
}

/// Whether this invocation is a build-switch relaunch.
pub fn has_switch_build_flag(arguments: &[String]) -> bool {
    arguments.iter().any(|argument| argument == SWITCH_BUILD_FLAG)
}

/// Parse a single scheme URI into a launch request.
///
/// # Errors
///
/// Returns [`LaunchError::MalformedUri`] when the URI does not parse or
/// carries the wrong scheme, [`LaunchError::UnsupportedAction`] for an
/// unknown action host, and [`LaunchError::MissingTarget`] for a connect
/// URI with an empty target.
pub fn parse_uri(uri: &str) -> Result<LaunchRequest, LaunchError> {
    let parsed = Url::parse(uri).map_err(|error| LaunchError::MalformedUri {
        message: format!("{uri:?}: {error}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    if parsed.scheme() != URI_SCHEME {
        return Err(LaunchError::MalformedUri {
            message: format!("Unexpected scheme {:?} in {uri:?}", parsed.scheme()),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    match parsed.host_str() {
        Some(CONNECT_ACTION) => {
            let path = parsed.path();
            let target = path.strip_prefix('/').unwrap_or(path);
            if target.is_empty() {
                return Err(LaunchError::MissingTarget {
                    message: format!("Connect URI {uri:?} has no target"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Ok(LaunchRequest::Connect {
                target: target.to_string(),
            })
        }
        Some(ACCEPT_AUTH_ACTION) => Ok(LaunchRequest::AuthPayload {
            payload: parsed.query().unwrap_or_default().to_string(),
        }),
        action => Err(LaunchError::UnsupportedAction {
            message: format!("Unsupported action {action:?} in {uri:?}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
