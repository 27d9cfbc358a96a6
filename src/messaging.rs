//! Domain-event publication to NATS. Publishing is best-effort: the
//! storefront keeps working when the broker is absent or unreachable.

use crate::domain::events::DomainEvent;

#[derive(Clone)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(client: Option<async_nats::Client>) -> Self {
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.client else {
            tracing::debug!(subject = event.subject(), "event publishing disabled");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize domain event");
                return;
            }
        };
        if let Err(err) = client.publish(event.subject(), payload.into()).await {
            tracing::warn!(
                subject = event.subject(),
                error = %err,
                "failed to publish domain event"
            );
        }
    }
}
