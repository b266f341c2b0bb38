use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tracing::trace;
use tracing::Level;

use crate::config::RuntimeConfig;
use crate::core::core_state::CoreState;
use crate::core::io::api_message::APIMessage;
use crate::core::TickHandle;
use crate::errors::Fatal;
use crate::storage::membership::NodeId;
use crate::Config;
use crate::Metrics;
use crate::TypeConfig;

/// RaftInner is the internal handle and provides internally used APIs to
/// communicate with `Core`.
pub(in crate::raft) struct RaftInner<C>
where C: TypeConfig
{
    pub(in crate::raft) id: NodeId,
    pub(in crate::raft) config: Arc<Config>,
    pub(in crate::raft) runtime_config: Arc<RuntimeConfig>,
    pub(in crate::raft) tick_handle: TickHandle,
    pub(in crate::raft) killed: Arc<AtomicBool>,
    pub(in crate::raft) tx_api: mpsc::UnboundedSender<APIMessage<C>>,
    pub(in crate::raft) tx_shutdown: Mutex<Option<oneshot::Sender<()>>>,
    pub(in crate::raft) rx_metrics: watch::Receiver<Metrics>,
    pub(in crate::raft) core_state: Mutex<CoreState>,
}

impl<C> RaftInner<C>
where C: TypeConfig
{
    /// Send a [`APIMessage`] to Core
    pub(crate) async fn send_msg(&self, mes: APIMessage<C>) -> Result<(), Fatal> {
        let send_res = self.tx_api.send(mes);

        if let Err(e) = send_res {
            let fatal = self
                .get_core_stopped_error(
                    "sending APIMessage to Core",
                    Some(e.0.to_string()),
                )
                .await;
            return Err(fatal);
        }
        Ok(())
    }

    /// Invoke Core by sending a [`APIMessage`] and blocks waiting for response.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) async fn call_core<T>(
        &self,
        mes: APIMessage<C>,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, Fatal>
    where
        T: Send,
    {
        let sum = if tracing::enabled!(Level::DEBUG) {
            Some(mes.to_string())
        } else {
            None
        };

        self.send_msg(mes).await?;

        let recv_res = rx.await;
        trace!(
            "id={} call_core receives result is error: {:?}",
            self.id,
            recv_res.is_err()
        );

        match recv_res {
            Ok(x) => Ok(x),
            Err(_) => {
                let fatal = self
                    .get_core_stopped_error("receiving rx from Core", sum)
                    .await;
                tracing::error!(error = debug(&fatal), "core_call fatal error");
                Err(fatal)
            }
        }
    }

    /// Get the error that caused Core to stop.
    pub(in crate::raft) async fn get_core_stopped_error(
        &self,
        when: impl fmt::Display,
        message_summary: Option<impl fmt::Display + Default>,
    ) -> Fatal {
        // Wait for the core task to finish.
        self.join_core_task().await;

        // Retrieve the result.
        let core_res = {
            let state = self.core_state.lock().unwrap();
            if let CoreState::Done(core_task_res) = &*state {
                core_task_res.clone()
            } else {
                Err(Fatal::Stopped)
            }
        };

        tracing::error!(
            core_result = debug(&core_res),
            "failure {}; message: {}",
            when,
            message_summary.unwrap_or_default()
        );

        match core_res {
            Ok(x) => match x {},
            Err(fatal) => fatal,
        }
    }

    /// Wait for `Core` task to finish and record the returned value from
    /// the task.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(in crate::raft) async fn join_core_task(&self) {
        // Get the Running state of Core,
        // or an error if Core has been in Joining state.
        let running_res = {
            let mut state = self.core_state.lock().unwrap();

            match &*state {
                CoreState::Running(_) => {
                    let (tx, rx) = watch::channel::<bool>(false);

                    let prev =
                        std::mem::replace(&mut *state, CoreState::Joining(rx));

                    let CoreState::Running(join_handle) = prev else {
                        unreachable!()
                    };

                    Ok((join_handle, tx))
                }
                CoreState::Joining(watch_rx) => Err(watch_rx.clone()),
                CoreState::Done(_) => {
                    // Core has already finished exiting, nothing to do
                    return;
                }
            }
        };

        match running_res {
            Ok((join_handle, tx)) => {
                let join_res = join_handle.await;

                tracing::info!(res = debug(&join_res), "Core exited");

                let core_task_res = match join_res {
                    Err(err) => {
                        if err.is_panic() {
                            Err(Fatal::Panicked)
                        } else {
                            Err(Fatal::Stopped)
                        }
                    }
                    Ok(returned_res) => returned_res,
                };

                {
                    let mut state = self.core_state.lock().unwrap();
                    *state = CoreState::Done(core_task_res);
                }
                tx.send(true).ok();
            }
            Err(mut rx) => {
                // Other thread is waiting for the core to finish.
                loop {
                    if *rx.borrow() {
                        break;
                    }
                    let res = rx.changed().await;
                    if res.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
