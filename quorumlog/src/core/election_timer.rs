//! The election timer of a node.
//!
//! Core owns the deadline in a `watch` channel. The timer task sleeps until
//! the deadline and reports it as expired, or wakes up early when Core moves
//! the deadline.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;
use tracing::Level;
use tracing::Span;

use crate::core::io::notification::Notification;

pub(crate) struct ElectionTimer {
    rx_deadline: watch::Receiver<Instant>,
    tx: mpsc::UnboundedSender<Notification>,
    killed: Arc<AtomicBool>,
}

impl ElectionTimer {
    pub(crate) fn spawn(
        rx_deadline: watch::Receiver<Instant>,
        tx: mpsc::UnboundedSender<Notification>,
        killed: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let this = Self {
            rx_deadline,
            tx,
            killed,
        };

        tokio::spawn(this.timer_loop().instrument(tracing::span!(
            parent: &Span::current(),
            Level::DEBUG,
            "election_timer"
        )))
    }

    async fn timer_loop(mut self) {
        loop {
            if self.killed.load(Ordering::Relaxed) {
                tracing::info!("killed, quit election timer");
                return;
            }

            let deadline = *self.rx_deadline.borrow_and_update();

            futures::select_biased! {
                changed = self.rx_deadline.changed().fuse() => {
                    if changed.is_err() {
                        tracing::info!("deadline sender dropped, quit election timer");
                        return;
                    }
                    // The deadline is moved, sleep again.
                }
                _ = tokio::time::sleep_until(deadline).fuse() => {
                    tracing::debug!("election deadline reached: {:?}", deadline);

                    if self.tx.send(Notification::ElectionTimeout { deadline }).is_err() {
                        tracing::info!("Core terminated, quit election timer");
                        return;
                    }

                    // Core always moves the deadline after an expiry.
                    if self.rx_deadline.changed().await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
