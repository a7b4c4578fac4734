pub mod channel;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod host;
pub mod launch;
pub mod overlay;
pub mod relaunch;
pub mod role;

#[cfg(test)]
mod tests;

pub const APP_IDENT: &str = "fivem";
pub const URI_SCHEME: &str = "fivem";
pub const SCHEME_PREFIX: &str = const_format::concatcp!(URI_SCHEME, ":");
pub const JOIN_URL_HOST: &str = "cfx.re";
pub const JOIN_URL_PREFIX: &str = const_format::concatcp!(JOIN_URL_HOST, "/join/");
