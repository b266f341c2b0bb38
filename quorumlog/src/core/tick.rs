//! The heartbeat ticker of a node.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;
use tracing::Level;
use tracing::Span;

use crate::config::RuntimeConfig;
use crate::core::io::notification::Notification;

/// Emit a `Tick` event at regular time interval, on which a leader sends
/// heartbeats.
pub(crate) struct Tick {
    interval: Duration,

    tx: mpsc::UnboundedSender<Notification>,

    runtime_config: Arc<RuntimeConfig>,

    killed: Arc<AtomicBool>,
}

pub(crate) struct TickHandle {
    runtime_config: Arc<RuntimeConfig>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Tick {
    pub(crate) fn spawn(
        interval: Duration,
        tx: mpsc::UnboundedSender<Notification>,
        runtime_config: Arc<RuntimeConfig>,
        killed: Arc<AtomicBool>,
    ) -> TickHandle {
        let (shutdown, shutdown_rx) = oneshot::channel();

        let this = Self {
            interval,
            tx,
            runtime_config: runtime_config.clone(),
            killed,
        };

        let join_handle = tokio::spawn(
            this.tick_loop(shutdown_rx)
                .instrument(tracing::span!(parent: &Span::current(), Level::DEBUG, "tick")),
        );

        TickHandle {
            runtime_config,
            shutdown: Mutex::new(Some(shutdown)),
            join_handle: Mutex::new(Some(join_handle)),
        }
    }

    pub(crate) async fn tick_loop(self, cancel_rx: oneshot::Receiver<()>) {
        let mut i = 0;

        let mut cancel = std::pin::pin!(cancel_rx.fuse());

        loop {
            if self.killed.load(Ordering::Relaxed) {
                tracing::info!("killed, quit tick loop");
                return;
            }

            let at = Instant::now() + self.interval;
            let mut sleep_fut = std::pin::pin!(tokio::time::sleep_until(at).fuse());

            futures::select_biased! {
                _ = sleep_fut => {
                    // continue
                }
                _ = cancel => {
                    tracing::info!("TickLoop received cancel signal, quit");
                    return;
                }
            }

            if !self.runtime_config.enable_tick.load(Ordering::Relaxed) {
                continue;
            }

            i += 1;

            let send_res = self.tx.send(Notification::Tick { i });
            if let Err(_e) = send_res {
                tracing::info!("Stopping tick_loop(), main loop terminated");
                break;
            } else {
                tracing::debug!("Tick sent: {}", i)
            }
        }
    }
}

impl TickHandle {
    pub(crate) fn enable(&self, enabled: bool) {
        self.runtime_config.enable_tick.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.runtime_config.enable_tick.load(Ordering::Relaxed)
    }

    /// Signal the tick loop to stop. And return a JoinHandle to wait for the
    /// loop to stop.
    ///
    /// If it is called twice, the second call will return None.
    pub(crate) fn shutdown(&self) -> Option<JoinHandle<()>> {
        {
            let shutdown = {
                let mut x = self.shutdown.lock().unwrap();
                x.take()
            };

            if let Some(shutdown) = shutdown {
                let send_res = shutdown.send(());
                tracing::info!(
                    "Timer shutdown signal sent: {}",
                    send_res.is_ok()
                );
            } else {
                tracing::warn!("Double call to TickHandle::shutdown()");
            }
        }

        let jh = {
            let mut x = self.join_handle.lock().unwrap();
            x.take()
        };
        jh
    }
}
