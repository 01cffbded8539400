//! Location sink boundary
//!
//! Device-tracker platforms report positions by handing a
//! [`LocationUpdate`] to a [`SeeDispatcher`]. The dispatcher forwards
//! updates over a bounded channel to the externally supplied "see"
//! function; the hand-off is fire-and-forget with drop-on-failure
//! semantics. Storage of known devices stays with the host.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Default capacity of the dispatch channel
pub const DEFAULT_DISPATCH_CAPACITY: usize = 64;

/// A normalized position report for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Device identifier
    pub dev_id: String,

    /// (latitude, longitude) pair
    pub gps: (f64, f64),

    /// GPS accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_accuracy: Option<i64>,

    /// Battery level, string-coerced by the reporting platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<String>,
}

impl LocationUpdate {
    pub fn new(dev_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            dev_id: dev_id.into(),
            gps: (latitude, longitude),
            gps_accuracy: None,
            battery: None,
        }
    }

    pub fn with_gps_accuracy(mut self, accuracy: i64) -> Self {
        self.gps_accuracy = Some(accuracy);
        self
    }

    pub fn with_battery(mut self, battery: impl Into<String>) -> Self {
        self.battery = Some(battery.into());
        self
    }
}

/// Externally supplied location-update function
pub type SeeFn = Arc<dyn Fn(LocationUpdate) -> BoxFuture<'static, ()> + Send + Sync>;

/// Channel hand-off to the location sink
///
/// `dispatch` never blocks: an update that does not fit in the channel (or
/// arrives after the drain task stopped) is logged and dropped, with no
/// compensating action.
#[derive(Clone)]
pub struct SeeDispatcher {
    tx: mpsc::Sender<LocationUpdate>,
}

impl SeeDispatcher {
    /// Create a dispatcher and spawn its drain task
    pub fn spawn(see: SeeFn, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<LocationUpdate>(capacity);

        let handle = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                see(update).await;
            }
        });

        (Self { tx }, handle)
    }

    /// Queue an update for the sink
    ///
    /// Returns whether the update was accepted; `false` means it was
    /// dropped.
    pub fn dispatch(&self, update: LocationUpdate) -> bool {
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(update)) => {
                warn!(dev_id = %update.dev_id, "Dispatch channel full, dropping location update");
                false
            }
            Err(mpsc::error::TrySendError::Closed(update)) => {
                warn!(dev_id = %update.dev_id, "Location sink gone, dropping location update");
                false
            }
        }
    }
}
