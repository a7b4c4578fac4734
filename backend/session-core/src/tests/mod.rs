mod channel;
mod coordinator;
mod gate;
mod overlay;
