//! The apply task: hands committed entries to the application.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use tracing::Level;
use tracing::Span;

use crate::core::io::notification::Notification;
use crate::raft::ApplyMessage;
use crate::storage::membership::NodeId;
use crate::TypeConfig;

/// Forwards [`ApplyMessage`]s queued by Core, in queue order, into the
/// application's bounded apply channel.
///
/// A slow consumer blocks this task only. Core stops queueing once
/// `max_apply_backlog` entries are waiting here.
pub(crate) struct Applier<C>
where C: TypeConfig
{
    id: NodeId,
    rx: mpsc::UnboundedReceiver<ApplyMessage<C>>,
    tx_apply: mpsc::Sender<ApplyMessage<C>>,
    tx_notification: mpsc::UnboundedSender<Notification>,
    killed: Arc<AtomicBool>,
}

impl<C> Applier<C>
where C: TypeConfig
{
    pub(crate) fn spawn(
        id: NodeId,
        rx: mpsc::UnboundedReceiver<ApplyMessage<C>>,
        tx_apply: mpsc::Sender<ApplyMessage<C>>,
        tx_notification: mpsc::UnboundedSender<Notification>,
        killed: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let this = Self {
            id,
            rx,
            tx_apply,
            tx_notification,
            killed,
        };

        tokio::spawn(this.apply_loop().instrument(tracing::span!(
            parent: &Span::current(),
            Level::DEBUG,
            "apply"
        )))
    }

    async fn apply_loop(mut self) {
        loop {
            if self.killed.load(Ordering::Relaxed) {
                tracing::info!("id={} killed, quit apply loop", self.id);
                return;
            }

            let Some(msg) = self.rx.recv().await else {
                tracing::info!("id={} Core terminated, quit apply loop", self.id);
                return;
            };

            // Checked again: a killed node must not deliver anything more.
            if self.killed.load(Ordering::Relaxed) {
                return;
            }

            let log_id = msg.log_id();
            tracing::debug!("id={} apply: {}", self.id, msg);

            if self.tx_apply.send(msg).await.is_err() {
                tracing::warn!(
                    "id={} apply channel is closed, stop applying at {}",
                    self.id,
                    log_id
                );
                return;
            }

            let _ = self.tx_notification.send(Notification::Applied { log_id });
        }
    }
}
