use rust_decimal::Decimal;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::ws_types::{BalanceUpdate, WsMessage};

/// Fan-out of domain events. Publishing never blocks and never fails the
/// caller: with no subscribers the event is simply dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<WsMessage>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, message: WsMessage) {
        if let Err(e) = self.tx.send(message) {
            tracing::trace!(event = ?e.0, "No subscribers for event");
        }
    }

    pub fn balance_updated(&self, user_id: Uuid, balance: Decimal) {
        self.publish(WsMessage::BalanceUpdated(BalanceUpdate { user_id, balance }));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.balance_updated(Uuid::nil(), dec!(42.50));

        match rx.recv().await.unwrap() {
            WsMessage::BalanceUpdated(update) => assert_eq!(update.balance, dec!(42.50)),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        Notifier::new(1).balance_updated(Uuid::nil(), dec!(1));
    }
}
