//! Cloneable handle for feeding events to the coordinator actor.

use crate::coordinator::event::Event;
use crate::engine::{InterceptDecision, ResumeTicket};
use crate::error::coordinator::CoordinatorError;

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

/// Handle to the coordinator actor.
///
/// Cheap to clone; every producer (UI, engine callbacks, host hooks, the
/// frame ticker) holds its own clone of the same underlying channel.
#[derive(Clone)]
pub struct CoordinatorHandle {
    event_tx: mpsc::Sender<Event>,
}

impl CoordinatorHandle {
    pub(crate) fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self { event_tx }
    }

    /// Request a connection to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Dispatch`] if the actor is gone.
    pub async fn connect_to(
        &self,
        target: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::Connect {
            target: target.into(),
        })
        .await
    }

    /// Abort an in-flight connect attempt.
    pub async fn cancel_connect(&self) -> Result<(), CoordinatorError> {
        self.send(Event::CancelConnect).await
    }

    /// Tear down the active session.
    pub async fn disconnect(&self) -> Result<(), CoordinatorError> {
        self.send(Event::Disconnect).await
    }

    /// Forward the user's response to a presented connection card.
    pub async fn submit_card_response(
        &self,
        data: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::SubmitCardResponse { data: data.into() }).await
    }

    /// Hand over an auth payload for delivery to the overlay.
    pub async fn handle_auth_payload(
        &self,
        payload: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::AuthPayload {
            payload: payload.into(),
        })
        .await
    }

    /// The overlay finished loading.
    pub async fn ui_ready(&self) -> Result<(), CoordinatorError> {
        self.send(Event::UiReady).await
    }

    /// Enqueue one host tick.
    ///
    /// Never blocks and never fails the tick: with the queue full the tick
    /// is dropped, and the next one repeats the housekeeping.
    pub fn frame_tick(&self) {
        match self.event_tx.try_send(Event::FrameTick) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Frame tick dropped, coordinator is busy"),
            Err(TrySendError::Closed(_)) => warn!("Frame tick dropped, coordinator is gone"),
        }
    }

    /// Request process exit.
    pub async fn exit(&self) -> Result<(), CoordinatorError> {
        self.send(Event::Exit).await
    }

    /// Engine callback: connection established at `address`.
    pub async fn connection_success(
        &self,
        address: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::ConnectionSuccess {
            address: address.into(),
        })
        .await
    }

    /// Engine callback: the attempt failed with `message`.
    pub async fn connection_error(
        &self,
        message: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::ConnectionError {
            message: message.into(),
        })
        .await
    }

    /// Engine callback: progress for the current attempt.
    pub async fn connection_progress(
        &self,
        message: impl Into<String>,
        current: u32,
        total: u32,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::ConnectionProgress {
            message: message.into(),
            current,
            total,
        })
        .await
    }

    /// Engine callback: the server presented a connection card.
    pub async fn card_presented(
        &self,
        card: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::CardPresented {
            card: card.into(),
            token: token.into(),
        })
        .await
    }

    /// Ask the interception gate whether the connection may be swapped
    /// now.
    ///
    /// On [`InterceptDecision::Wait`] the `ticket` is parked and will come
    /// back through the engine's `resume_connect` after teardown.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Dispatch`] if the actor is gone and
    /// [`CoordinatorError::Reply`] if it dropped the reply channel.
    pub async fn intercept_check(
        &self,
        target: impl Into<String>,
        ticket: ResumeTicket,
    ) -> Result<InterceptDecision, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Event::InterceptCheck {
            target: target.into(),
            ticket,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(|_| CoordinatorError::Reply {
            message: "Coordinator dropped the intercept reply".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Host lifecycle: a session world finished loading.
    pub async fn session_finalized_load(&self) -> Result<(), CoordinatorError> {
        self.send(Event::SessionFinalizedLoad).await
    }

    /// Host lifecycle: previously loaded session state is fully torn
    /// down.
    pub async fn shutdown_session(&self) -> Result<(), CoordinatorError> {
        self.send(Event::ShutdownSession).await
    }

    /// Host lifecycle: the host started loading a session world.
    pub async fn game_request_load(&self) -> Result<(), CoordinatorError> {
        self.send(Event::GameRequestLoad).await
    }

    /// Host lifecycle: the network layer was killed.
    pub async fn network_killed(
        &self,
        reason: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Event::NetworkKilled {
            reason: reason.into(),
        })
        .await
    }

    /// Whether a connect attempt is currently in flight.
    ///
    /// Also useful as a barrier: the reply proves every earlier event on
    /// this handle has been processed.
    pub async fn is_connecting(&self) -> Result<bool, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Event::QueryConnecting { reply: reply_tx }).await?;

        reply_rx.await.map_err(|_| CoordinatorError::Reply {
            message: "Coordinator dropped the query reply".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    async fn send(&self, event: Event) -> Result<(), CoordinatorError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|error| CoordinatorError::Dispatch {
                message: format!("Coordinator actor died: {error}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
