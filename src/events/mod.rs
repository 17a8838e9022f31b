use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after successful mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderDeleted(Uuid),
    OrderCompleted(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Stock ledger events
    StockItemCreated(Uuid),
    UnitsReceived {
        item_id: Uuid,
        count: usize,
    },
    UnitAssigned {
        unit_id: Uuid,
        order_id: Uuid,
    },
    UnitUnassigned {
        unit_id: Uuid,
        order_id: Uuid,
    },
    UnitSignedOut {
        unit_id: Uuid,
        signed_out_by: String,
    },
    UnitReturned {
        unit_id: Uuid,
        returned_by: String,
    },
    PartialAssignmentWarning {
        order_id: Uuid,
        item_id: Uuid,
        requested: i64,
        assigned: i64,
    },

    // Promotional counter events
    PromotionalItemSignedOut(Uuid),
    PromotionalItemReturned(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events from the channel and logs them. Future integrations
/// (notifications, sync hooks) subscribe here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCompleted(order_id) => {
                info!(order_id = %order_id, "Order completed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::PartialAssignmentWarning {
                order_id,
                item_id,
                requested,
                assigned,
            } => {
                warn!(
                    order_id = %order_id,
                    item_id = %item_id,
                    requested = requested,
                    assigned = assigned,
                    "Partial fulfillment: fewer units available than requested"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
