pub mod channel;
pub mod coordinator;
pub mod launch;
pub mod relaunch;
pub mod role;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Channel(#[from] channel::ChannelError),

    #[error(transparent)]
    Coordinator(#[from] coordinator::CoordinatorError),

    #[error(transparent)]
    Launch(#[from] launch::LaunchError),

    #[error(transparent)]
    Relaunch(#[from] relaunch::RelaunchError),

    #[error(transparent)]
    Role(#[from] role::RoleError),
}
