//! # Dispatcher
//!
//! Glue between the filter, the executor, and the notifier: one call per
//! inbound event, plus the worker loop that drains the event channel in
//! arrival order. Failures handling one event never stop the loop.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::executor::{ExecError, TriggerExecutor};
use crate::application::filter::EventFilter;
use crate::application::notifier::Notifier;
use crate::domain::types::InboundMessage;
use crate::strings::messages;

pub struct Dispatcher {
    filter: EventFilter,
    executor: TriggerExecutor,
    notifier: Notifier,
}

impl Dispatcher {
    pub fn new(filter: EventFilter, executor: TriggerExecutor, notifier: Notifier) -> Self {
        Self {
            filter,
            executor,
            notifier,
        }
    }

    /// Drain the inbound event channel until it closes or shutdown is
    /// requested. Events are processed one at a time in arrival order, so
    /// overlapping triggers queue behind the running one. Shutdown is honored
    /// both between events and during an in-flight bounded wait (dropping the
    /// wait kills the child process).
    pub async fn run(&self, mut events: mpsc::Receiver<InboundMessage>, shutdown: CancellationToken) {
        loop {
            let msg = tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe = events.recv() => match maybe {
                    Some(msg) => msg,
                    None => break,
                },
            };

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, abandoning in-flight trigger");
                    break;
                }
                _ = self.handle_message(msg) => {}
            }
        }
    }

    /// Process one inbound event end to end. Never returns an error: every
    /// failure is logged and recovered so the next event can be processed.
    pub async fn handle_message(&self, msg: InboundMessage) {
        let Some(ctx) = self.filter.evaluate(&msg) else {
            return;
        };

        let chat_id = ctx.chat_id.clone();
        let started_text = messages::execution_started(&ctx.message_id);
        let result = self
            .executor
            .execute(&ctx, || self.notifier.notify(&chat_id, &started_text))
            .await;

        match result {
            Ok(result) => {
                tracing::info!("Script finished: exit_code={}", result.exit_code);
                if !result.stdout.is_empty() {
                    tracing::info!("Script stdout: {}", result.stdout.trim());
                }
                if !result.stderr.is_empty() {
                    tracing::warn!("Script stderr: {}", result.stderr.trim());
                }
            }
            Err(err @ ExecError::Timeout(_)) => {
                tracing::error!("{err}");
            }
            Err(err) => {
                tracing::error!("Failed to execute script: {err}");
            }
        }
    }
}
