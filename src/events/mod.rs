use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Cloneable handle for publishing domain events onto the in-process bus.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {}", e))
    }

    /// Publishes an event, logging instead of failing when the receiver
    /// side has shut down. Services use this so a closed bus never turns
    /// into a request error.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("event dropped: {:?}: {}", event, e);
        }
    }
}

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Orders
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(Uuid),

    // Carts
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartCleared(Uuid),
    CartConverted { cart_id: Uuid, user_id: Uuid },

    // Discounts and sales
    DiscountCreated(Uuid),
    DiscountApplied {
        discount_id: Uuid,
        order_value: rust_decimal::Decimal,
        discount_amount: rust_decimal::Decimal,
    },
    SaleCreated(Uuid),

    // Catalog
    ProductCreated(Uuid),
    ProductStockChanged { product_id: Uuid, stock: i32 },
    ProductDeleted(Uuid),

    // Reviews
    ReviewSubmitted { review_id: Uuid, product_id: Uuid },
    ReviewModerated { review_id: Uuid, status: String },
}

/// Drains the event channel, logging each event. Runs for the lifetime
/// of the process; exits when every sender has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(%order_id, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "order status changed");
            }
            Event::DiscountApplied {
                discount_id,
                order_value,
                discount_amount,
            } => {
                info!(%discount_id, %order_value, %discount_amount, "discount applied");
            }
            Event::CartConverted { cart_id, user_id } => {
                info!(%cart_id, %user_id, "cart converted to order");
            }
            other => {
                debug!(event = ?other, "event processed");
            }
        }
    }

    info!("event channel closed, stopping event loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();
        sender.send(Event::OrderCreated(id)).await.unwrap();
        match rx.recv().await {
            Some(Event::OrderCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out.
        sender.send_or_log(Event::CartCleared(Uuid::new_v4())).await;
    }
}
