mod helpers;

mod coordinator;
mod poller;
