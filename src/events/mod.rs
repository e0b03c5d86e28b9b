use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

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

    /// Sends an event, logging instead of failing when the consumer is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Things the admin backend did that are worth an audit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Orders
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderDeleted(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Catalog
    ProductCreated {
        product_id: Uuid,
        seller_id: Uuid,
    },
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    MasterProductCloned {
        master_product_id: Uuid,
        product_id: Uuid,
        seller_id: Uuid,
    },
    VariantGroupAssigned {
        product_id: Uuid,
        variant_group_id: Uuid,
    },

    // Bulk and import jobs
    BulkOperationCompleted {
        entity: String,
        operation: String,
        updated: usize,
        failed: usize,
    },
    ProductsImported {
        imported: usize,
        failed: usize,
    },
    ReceiptReconciled {
        seller_id: Uuid,
        created: usize,
        linked: usize,
        failed: usize,
    },

    // Delivery
    DeliveryPartnerAvailabilityChanged {
        partner_id: Uuid,
        is_online: bool,
        is_available: bool,
    },
    DeliveryRejected {
        partner_id: Uuid,
        order_id: Uuid,
    },

    // Settings
    FeatureFlagChanged {
        key: String,
        enabled: bool,
    },
    AppConfigChanged {
        key: String,
    },
    AdminMessagePublished(Uuid),

    AdminLoggedIn(Uuid),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderCreated(_) => "order_created",
            Event::OrderUpdated(_) => "order_updated",
            Event::OrderDeleted(_) => "order_deleted",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::ProductCreated { .. } => "product_created",
            Event::ProductUpdated(_) => "product_updated",
            Event::ProductDeleted(_) => "product_deleted",
            Event::MasterProductCloned { .. } => "master_product_cloned",
            Event::VariantGroupAssigned { .. } => "variant_group_assigned",
            Event::BulkOperationCompleted { .. } => "bulk_operation_completed",
            Event::ProductsImported { .. } => "products_imported",
            Event::ReceiptReconciled { .. } => "receipt_reconciled",
            Event::DeliveryPartnerAvailabilityChanged { .. } => {
                "delivery_partner_availability_changed"
            }
            Event::DeliveryRejected { .. } => "delivery_rejected",
            Event::FeatureFlagChanged { .. } => "feature_flag_changed",
            Event::AppConfigChanged { .. } => "app_config_changed",
            Event::AdminMessagePublished(_) => "admin_message_published",
            Event::AdminLoggedIn(_) => "admin_logged_in",
        }
    }
}

/// Drains the event channel and writes one structured log line per event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        let name = event.name();
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(event = name, %order_id, %old_status, %new_status, "Order status changed");
            }
            Event::BulkOperationCompleted {
                entity,
                operation,
                updated,
                failed,
            } => {
                if *failed > 0 {
                    warn!(event = name, %entity, %operation, updated, failed, "Bulk operation finished with errors");
                } else {
                    info!(event = name, %entity, %operation, updated, "Bulk operation finished");
                }
            }
            Event::ReceiptReconciled {
                seller_id,
                created,
                linked,
                failed,
            } => {
                info!(event = name, %seller_id, created, linked, failed, "Receipt reconciled");
            }
            other => {
                let payload = serde_json::to_string(other).unwrap_or_default();
                info!(event = name, payload = %payload, "Domain event");
            }
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        drop(rx);
        assert!(sender.send(Event::OrderCreated(Uuid::new_v4())).await.is_err());
    }

    #[tokio::test]
    async fn consumer_drains_until_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let handle = tokio::spawn(process_events(rx));
        sender
            .send(Event::FeatureFlagChanged {
                key: "new_checkout".into(),
                enabled: true,
            })
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}
