//! # Event Listener
//!
//! Attaches a dispatcher to an inbound event stream. Events are dispatched one
//! at a time, in arrival order, on a background task until the listener is
//! stopped or the sending side closes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::context::InboundEvent;
use super::dispatcher::Dispatcher;

/// Default capacity for inbound event channels
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct Listener;

impl Listener {
    /// Create an inbound channel sized for the listener
    pub fn channel() -> (mpsc::Sender<InboundEvent>, mpsc::Receiver<InboundEvent>) {
        mpsc::channel(EVENT_CHANNEL_CAPACITY)
    }

    /// Start dispatching events from `receiver`
    ///
    /// Dropping the returned handle stops the listener.
    pub fn start(dispatcher: Dispatcher, receiver: mpsc::Receiver<InboundEvent>) -> ListenerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(Self::run(dispatcher, receiver, stop_rx));
        info!("👂 Command listener started");

        ListenerHandle {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    async fn run(
        dispatcher: Dispatcher,
        mut receiver: mpsc::Receiver<InboundEvent>,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> usize {
        let mut dispatched = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    debug!("Listener received stop signal");
                    break;
                }
                event = receiver.recv() => {
                    let Some(event) = event else {
                        debug!("Inbound event channel closed");
                        break;
                    };
                    let outcome = dispatcher.dispatch(event).await;
                    debug!("Dispatch outcome: {outcome:?}");
                    dispatched += 1;
                }
            }
        }
        info!("👋 Command listener stopped after {dispatched} event(s)");
        dispatched
    }
}

/// Handle to a running listener
pub struct ListenerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<usize>,
}

impl ListenerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop listening and wait for the loop to exit
    ///
    /// An event already being dispatched finishes first. Returns the number of
    /// events dispatched.
    pub async fn stop(mut self) -> usize {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.join().await
    }

    /// Wait for the loop to exit on its own (the sender side closed)
    pub async fn join(self) -> usize {
        match self.task.await {
            Ok(dispatched) => dispatched,
            Err(e) => {
                error!("❌ Command listener ended abnormally: {e}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::binder::{BoundArgs, SlotKind};
    use crate::commands::context::testing::*;
    use crate::commands::context::{ChannelMessageEvent, ExecutionContext, PrivateMessageEvent};
    use crate::commands::descriptor::CommandDescriptor;
    use crate::commands::handler::{CommandExecutor, HandlerOutput};
    use crate::core::config::DispatchConfig;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoCommand;

    #[async_trait]
    impl CommandExecutor for EchoCommand {
        fn parameters(&self) -> Vec<SlotKind> {
            vec![SlotKind::Arguments]
        }

        async fn execute(&self, args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
            Ok(HandlerOutput::text(args.list(0).join(" ")))
        }
    }

    struct PanickingCommand;

    #[async_trait]
    impl CommandExecutor for PanickingCommand {
        async fn execute(&self, _args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
            let replies: Vec<String> = Vec::new();
            Ok(HandlerOutput::text(replies[0].clone()))
        }
    }

    async fn dispatcher() -> (Dispatcher, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(
            &DispatchConfig::default(),
            transport.clone(),
            Arc::new(StaticLookup::default()),
        )
        .unwrap();
        dispatcher
            .register(CommandDescriptor::builder(Arc::new(EchoCommand)).alias("echo").build())
            .await
            .unwrap();
        (dispatcher, transport)
    }

    #[tokio::test]
    async fn test_dispatches_in_order_until_closed() {
        let (dispatcher, transport) = dispatcher().await;
        let (tx, rx) = Listener::channel();
        let handle = Listener::start(dispatcher, rx);

        tx.send(ChannelMessageEvent::new(lobby(), alice(), "!echo one").into())
            .await
            .unwrap();
        tx.send(PrivateMessageEvent::new(alice(), "!echo two").into())
            .await
            .unwrap();
        tx.send(ChannelMessageEvent::new(lobby(), alice(), "no command").into())
            .await
            .unwrap();
        drop(tx);

        assert_eq!(handle.join().await, 3);
        assert_eq!(
            transport.sent().await,
            vec![
                Sent::Channel {
                    channel: "lobby".to_string(),
                    text: "one".to_string()
                },
                Sent::Private {
                    user: "alice".to_string(),
                    text: "two".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_detaches_listener() {
        let (dispatcher, transport) = dispatcher().await;
        let (tx, rx) = Listener::channel();
        let handle = Listener::start(dispatcher, rx);
        assert!(handle.is_running());

        assert_eq!(handle.stop().await, 0);

        // Receiver is gone once the listener has stopped
        let result = tx
            .send(ChannelMessageEvent::new(lobby(), alice(), "!echo late").into())
            .await;
        assert!(result.is_err());
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_handler_panic_is_swallowed() {
        let (dispatcher, transport) = dispatcher().await;
        dispatcher
            .register(CommandDescriptor::builder(Arc::new(PanickingCommand)).alias("boom").build())
            .await
            .unwrap();
        let (tx, rx) = Listener::channel();
        let handle = Listener::start(dispatcher, rx);

        tx.send(ChannelMessageEvent::new(lobby(), alice(), "!boom").into())
            .await
            .unwrap();
        tx.send(ChannelMessageEvent::new(lobby(), alice(), "!echo still alive").into())
            .await
            .unwrap();
        drop(tx);

        assert_eq!(handle.join().await, 2);
        assert_eq!(
            transport.sent().await,
            vec![Sent::Channel {
                channel: "lobby".to_string(),
                text: "still alive".to_string()
            }]
        );
    }
}
