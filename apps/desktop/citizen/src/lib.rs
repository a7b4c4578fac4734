// Library exports for testing
// The binary (main.rs) imports these as well

pub mod console;
pub mod engine;
pub mod error;
pub mod host;
pub mod logger;
pub mod overlay;
pub mod shell;

#[cfg(test)]
mod tests;
