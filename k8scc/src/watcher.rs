//! Polling watcher following a pod until it reaches a terminal phase.
//!
//! The watcher alternates three effects: reading the pod phase, sleeping, and
//! checking for cancellation. Cancellation comes either from the shutdown
//! channel or from the optional overall deadline of [`WatchConfig`].

use k8scc_config::shared::{RetryConfig, WatchConfig};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::concurrency::shutdown::ShutdownRx;
use crate::k8s::{K8sClient, K8sError, PodPhase};

/// Why a watch stopped before the pod reached a terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Shutdown,
    Deadline,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Shutdown => f.write_str("shutdown requested"),
            CancelReason::Deadline => f.write_str("deadline exceeded"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch of pod {pod} was cancelled: {reason}")]
    Cancelled { pod: String, reason: CancelReason },

    #[error("pod {pod} disappeared while being watched")]
    Disappeared { pod: String },

    #[error("pod {pod} was never found")]
    NotFound { pod: String },

    #[error("failed to read the state of pod {pod}: {source}")]
    Api {
        pod: String,
        #[source]
        source: K8sError,
    },
}

/// Watches pods through a [`K8sClient`].
pub struct PodWatcher<'a, C: ?Sized> {
    client: &'a C,
    poll_interval: Duration,
    timeout: Option<Duration>,
    retry: RetryConfig,
    shutdown_rx: ShutdownRx,
}

impl<'a, C> PodWatcher<'a, C>
where
    C: K8sClient + ?Sized,
{
    pub fn new(client: &'a C, config: &WatchConfig, shutdown_rx: ShutdownRx) -> Self {
        Self {
            client,
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
            retry: config.retry.clone(),
            shutdown_rx,
        }
    }

    /// Blocks until the pod `pod` succeeds or fails.
    ///
    /// Returns `Ok(true)` on `Succeeded` and `Ok(false)` on `Failed`. Pending,
    /// running and unknown phases keep the watch going. Transient API errors,
    /// and a pod not found before its first observation, are retried with
    /// backoff until [`RetryConfig::max_attempts`] consecutive failures.
    pub async fn watch_until_terminal(&mut self, pod: &str) -> Result<bool, WatchError> {
        let deadline = self.deadline();
        let mut last_phase = None;
        let mut failures = 0;

        loop {
            self.check_cancelled(pod, deadline)?;

            let delay = match self.client.get_pod_phase(pod).await {
                Ok(Some(phase)) => {
                    failures = 0;
                    if last_phase != Some(phase) {
                        info!(pod, %phase, "pod phase changed");
                        last_phase = Some(phase);
                    }

                    match phase {
                        PodPhase::Succeeded => return Ok(true),
                        PodPhase::Failed => return Ok(false),
                        PodPhase::Pending | PodPhase::Running | PodPhase::Unknown => {
                            self.poll_interval
                        }
                    }
                }
                Ok(None) if last_phase.is_some() => {
                    return Err(WatchError::Disappeared {
                        pod: pod.to_owned(),
                    });
                }
                Ok(None) => {
                    failures += 1;
                    if failures >= self.retry.max_attempts {
                        return Err(WatchError::NotFound {
                            pod: pod.to_owned(),
                        });
                    }
                    debug!(pod, failures, "pod not visible yet");
                    self.retry.delay_for_attempt(failures)
                }
                Err(err) => self.backoff(pod, &mut failures, err)?,
            };

            self.sleep(pod, delay, deadline).await?;
        }
    }

    /// Blocks until the pod `pod` no longer exists.
    pub async fn wait_until_deleted(&mut self, pod: &str) -> Result<(), WatchError> {
        let deadline = self.deadline();
        let mut failures = 0;

        loop {
            self.check_cancelled(pod, deadline)?;

            let delay = match self.client.get_pod_phase(pod).await {
                Ok(None) => return Ok(()),
                Ok(Some(phase)) => {
                    failures = 0;
                    debug!(pod, %phase, "waiting for pod deletion");
                    self.poll_interval
                }
                Err(err) => self.backoff(pod, &mut failures, err)?,
            };

            self.sleep(pod, delay, deadline).await?;
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }

    /// Returns the delay before retrying after `err`, or the error when it is
    /// definitive or the retry budget is spent.
    fn backoff(&self, pod: &str, failures: &mut u32, err: K8sError) -> Result<Duration, WatchError> {
        if !err.is_transient() {
            return Err(WatchError::Api {
                pod: pod.to_owned(),
                source: err,
            });
        }

        *failures += 1;
        if *failures >= self.retry.max_attempts {
            return Err(WatchError::Api {
                pod: pod.to_owned(),
                source: err,
            });
        }

        let delay = self.retry.delay_for_attempt(*failures);
        warn!(
            pod,
            failures,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient error while reading pod state, retrying"
        );

        Ok(delay)
    }

    fn check_cancelled(&self, pod: &str, deadline: Option<Instant>) -> Result<(), WatchError> {
        if self.shutdown_rx.has_changed().unwrap_or(false) {
            return Err(cancelled(pod, CancelReason::Shutdown));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(cancelled(pod, CancelReason::Deadline));
        }

        Ok(())
    }

    /// Sleeps for `delay`, waking up early on shutdown or at the deadline.
    async fn sleep(
        &mut self,
        pod: &str,
        delay: Duration,
        deadline: Option<Instant>,
    ) -> Result<(), WatchError> {
        let mut wake_at = Instant::now() + delay;
        let mut hits_deadline = false;
        if let Some(deadline) = deadline {
            if deadline <= wake_at {
                wake_at = deadline;
                hits_deadline = true;
            }
        }

        let sleep = tokio::time::sleep_until(wake_at);
        tokio::pin!(sleep);

        // A dropped sender can never signal again, the sleep alone decides then.
        let mut shutdown_open = true;
        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed(), if shutdown_open => match changed {
                    Ok(()) => return Err(cancelled(pod, CancelReason::Shutdown)),
                    Err(_) => shutdown_open = false,
                },
                _ = &mut sleep => break,
            }
        }

        if hits_deadline {
            return Err(cancelled(pod, CancelReason::Deadline));
        }

        Ok(())
    }
}

fn cancelled(pod: &str, reason: CancelReason) -> WatchError {
    WatchError::Cancelled {
        pod: pod.to_owned(),
        reason,
    }
}
