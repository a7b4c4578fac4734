mod engine;
mod error;
mod logger;
