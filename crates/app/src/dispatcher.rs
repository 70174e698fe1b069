//! Command dispatcher — turns inbound control messages into state events.
//!
//! Every inbound payload is answered with exactly one event:
//!
//! - malformed payload → `error` / `bad_json`
//! - `status` / `scan` → fresh device listing (or `w1_read` failure)
//! - `test` → presence test outcome, or `error` / `busy` when one is running
//! - anything else → `error` / `unknown_action`
//!
//! Presence tests run on their own task so listings keep being answered
//! while a test is waiting for a device.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use ibtester_domain::command::{Action, CommandRequest};
use ibtester_domain::event::{ListingKind, Rejection, StateEvent};

use crate::ports::{DeviceSource, Transport};
use crate::presence_test::{PresenceTest, TestSettings};
use crate::publisher::EventPublisher;
use crate::registry::DeviceRegistry;

/// Routes decoded commands to the registry or the presence test engine.
pub struct Dispatcher<S, T> {
    registry: Arc<DeviceRegistry<S>>,
    engine: Arc<PresenceTest<S>>,
    publisher: Arc<EventPublisher<T>>,
    /// Held for the whole lifetime of a test session, including the publish
    /// of its outcome.
    session: Arc<Mutex<()>>,
}

impl<S, T> Dispatcher<S, T>
where
    S: DeviceSource + 'static,
    T: Transport + 'static,
{
    pub fn new(
        registry: DeviceRegistry<S>,
        settings: TestSettings,
        publisher: EventPublisher<T>,
    ) -> Self {
        let registry = Arc::new(registry);
        Self {
            engine: Arc::new(PresenceTest::new(Arc::clone(&registry), settings)),
            registry,
            publisher: Arc::new(publisher),
            session: Arc::new(Mutex::new(())),
        }
    }

    /// Publish the startup announcement.
    pub async fn announce(&self) {
        self.publisher.publish(&StateEvent::Startup).await;
    }

    /// Handle one inbound payload.
    ///
    /// Returns the handle of the background task when a presence test was
    /// started; every other command is fully answered before this returns.
    #[tracing::instrument(skip_all)]
    pub async fn handle(&self, payload: &[u8]) -> Option<JoinHandle<()>> {
        tracing::debug!(payload = %String::from_utf8_lossy(payload), "command received");

        let request = match CommandRequest::decode(payload) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(%err, "rejecting malformed command");
                self.reject(Rejection::BadJson).await;
                return None;
            }
        };

        match request.action {
            Action::Status => {
                self.report_devices(ListingKind::Status).await;
                None
            }
            Action::Scan => {
                self.report_devices(ListingKind::Scan).await;
                None
            }
            Action::Test => self.start_test(request.timeout).await,
            Action::Unknown(action) => {
                tracing::warn!(%action, "rejecting unknown action");
                self.reject(Rejection::UnknownAction).await;
                None
            }
        }
    }

    /// Answer every payload received on `inbound` until the channel closes.
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<Vec<u8>>) {
        while let Some(payload) = inbound.recv().await {
            self.handle(&payload).await;
        }
        tracing::info!("command channel closed");
    }

    async fn report_devices(&self, kind: ListingKind) {
        let event = match self.registry.enumerate().await {
            Ok(devices) => StateEvent::Devices { kind, devices },
            Err(err) => {
                tracing::warn!(%err, kind = kind.as_str(), "w1 scan failed");
                StateEvent::DevicesUnreadable { kind }
            }
        };
        self.publisher.publish(&event).await;
    }

    async fn start_test(&self, timeout: Option<Duration>) -> Option<JoinHandle<()>> {
        let Ok(guard) = Arc::clone(&self.session).try_lock_owned() else {
            tracing::warn!("presence test already running, rejecting");
            self.reject(Rejection::Busy).await;
            return None;
        };

        let engine = Arc::clone(&self.engine);
        let publisher = Arc::clone(&self.publisher);
        Some(tokio::spawn(async move {
            let outcome = engine.run(timeout).await;
            publisher.publish(&StateEvent::Test(outcome)).await;
            drop(guard);
        }))
    }

    async fn reject(&self, rejection: Rejection) {
        self.publisher.publish(&StateEvent::Rejected(rejection)).await;
    }
}
