use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{DisputeResolvedEvent, EventHandler, EventProducer, Handler, PayoutCompletedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payout_completed_producer: Vec<EventProducer<PayoutCompletedEvent>>,
    pub dispute_resolved_producer: Vec<EventProducer<DisputeResolvedEvent>>,
}

pub struct EventHandlers {
    pub on_payout_completed: Option<EventHandler<PayoutCompletedEvent>>,
    pub on_dispute_resolved: Option<EventHandler<DisputeResolvedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payout_completed = hooks.on_payout_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_dispute_resolved = hooks.on_dispute_resolved.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payout_completed, on_dispute_resolved }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payout_completed {
            result.payout_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_dispute_resolved {
            result.dispute_resolved_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payout_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_dispute_resolved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payout_completed: Option<Handler<PayoutCompletedEvent>>,
    pub on_dispute_resolved: Option<Handler<DisputeResolvedEvent>>,
}

impl EventHooks {
    pub fn on_payout_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payout_completed = Some(Arc::new(f));
        self
    }

    pub fn on_dispute_resolved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DisputeResolvedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_dispute_resolved = Some(Arc::new(f));
        self
    }
}
