//! The connection-health supervisor.
//!
//! # State machine
//!
//! ```text
//!                 success                    outage
//!  not init ─────────────────► available ◄──────────► unavailable
//!     │                            ▲        success        │
//!     └──────── outage ────────────┼───────────────────────┘
//!                                  │
//!            ambiguous failure: status untouched
//! ```
//!
//! Every supervised call records its begin and end times. A failure the
//! [`FailureClassifier`] recognizes as an outage marks the connection
//! unavailable and, while the supervisor is uninitialized or monitoring
//! is enabled, starts the recovery loop: sleep out the rest of the
//! heartbeat interval, probe with [`Supervised::ping`], repeat until
//! available. At most one recovery loop runs per supervisor.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use restbind_core::{ApiError, Context, Error};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::SupervisorConfig;
use crate::failure::{FailureClassifier, TransportFailureClassifier};
use crate::status::ConnStatus;

/// A client the supervisor can probe and repair.
#[async_trait]
pub trait Supervised: Send + Sync + 'static {
    /// Minimal round-trip to the server.
    async fn ping(&self) -> Result<(), Error>;

    /// Recovery hook run after a failed call (reconnect, re-authenticate).
    /// Failures are logged and ignored.
    async fn restore(&self, _ctx: Option<&Context>) -> Result<(), Error> {
        Ok(())
    }

    /// Told about every failed call before `restore`. Failures are logged
    /// and ignored.
    async fn notify_error(&self, _error: &Error) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Call,
    Probe,
}

struct Outcome<T> {
    result: Result<T, Error>,
    outage: bool,
}

struct Inner<C> {
    client: C,
    classifier: Box<dyn FailureClassifier>,
    config: SupervisorConfig,
    status: watch::Sender<ConnStatus>,
    initialized: AtomicBool,
    /// Set while a recovery loop is scheduled or running.
    recovering: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl<C: Supervised> Inner<C> {
    fn should_recover(&self) -> bool {
        self.config.enable_monitor || !self.initialized.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        self.status.borrow().available
    }

    async fn observe<T, Fut>(&self, origin: Origin, call: Fut) -> Outcome<T>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        self.status
            .send_modify(|s| s.last_check_begin_time = Some(Utc::now()));

        let result = call.await;
        let ended = Utc::now();

        let error = match result {
            Ok(value) => {
                self.status.send_modify(|s| s.mark_available(ended));
                return Outcome {
                    result: Ok(value),
                    outage: false,
                };
            }
            Err(error) => error,
        };

        let outage = self.classifier.outage_message(&error);

        if origin == Origin::Call {
            if let Err(e) = self.client.notify_error(&error).await {
                warn!(error = %e, "notify_error hook failed");
            }
        }
        if origin == Origin::Call || outage.is_some() {
            self.restore(&error).await;
        }

        self.status.send_modify(|s| {
            s.last_check_end_time = Some(ended);
            if let Some(message) = &outage {
                s.mark_outage(message.clone(), ended);
            }
        });

        match &outage {
            Some(message) => warn!(?origin, %message, "server unavailable"),
            None => debug!(?origin, error = %error, "ambiguous failure, status unchanged"),
        }

        Outcome {
            outage: outage.is_some(),
            result: Err(error),
        }
    }

    async fn restore(&self, error: &Error) {
        let ctx = error.as_api().map(ApiError::context);
        self.status
            .send_modify(|s| s.last_restore_begin_time = Some(Utc::now()));
        if let Err(e) = self.client.restore(ctx).await {
            warn!(error = %e, "restore hook failed");
        }
        self.status
            .send_modify(|s| s.last_restore_end_time = Some(Utc::now()));
    }

    /// Time left until the next probe is due.
    fn remaining_interval(&self) -> Duration {
        let heartbeat = self.config.heartbeat_interval();
        match self.status.borrow().last_check_end_time {
            None => Duration::ZERO,
            Some(end) => {
                let elapsed = (Utc::now() - end).to_std().unwrap_or(Duration::ZERO);
                heartbeat.saturating_sub(elapsed)
            }
        }
    }

    fn ensure_recovery(self: &Arc<Self>) {
        if self.recovering.swap(true, Ordering::SeqCst) {
            debug!("recovery already in progress");
            return;
        }
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.recover().await });
    }

    async fn recover(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();
        loop {
            debug!("recovery loop started");
            loop {
                let wait = self.remaining_interval();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = shutdown.wait_for(|stop| *stop) => {
                        debug!("recovery loop shutting down");
                        self.recovering.store(false, Ordering::SeqCst);
                        return;
                    }
                }

                let _ = self.observe(Origin::Probe, self.client.ping()).await;
                if self.is_available() {
                    break;
                }
            }

            info!("connection restored");
            self.recovering.store(false, Ordering::SeqCst);

            // An outage observed after the last probe saw the loop still
            // running and did not start another one.
            let lost_again = !self.is_available() && self.should_recover();
            if !lost_again || self.recovering.swap(true, Ordering::SeqCst) {
                return;
            }
        }
    }
}

/// Wraps a client, tracks whether its server is reachable and drives
/// recovery after outages.
///
/// Every call made through [`Supervisor::call`] is observed. Errors are
/// always returned to the caller unchanged; the status machine only
/// decides what happens next.
///
/// Dropping the supervisor stops its recovery loop.
pub struct Supervisor<C: Supervised> {
    inner: Arc<Inner<C>>,
}

impl<C: Supervised> Supervisor<C> {
    /// Supervise `client`, treating network failures and time-outs as
    /// outages.
    pub fn new(client: C, config: SupervisorConfig) -> Self {
        Self::with_classifier(client, config, TransportFailureClassifier)
    }

    pub fn with_classifier(
        client: C,
        config: SupervisorConfig,
        classifier: impl FailureClassifier + 'static,
    ) -> Self {
        let (status, _) = watch::channel(ConnStatus::not_init());
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                client,
                classifier: Box::new(classifier),
                config,
                status,
                initialized: AtomicBool::new(false),
                recovering: AtomicBool::new(false),
                shutdown,
            }),
        }
    }

    /// Wait until the server is available for the first time.
    ///
    /// Starts probing if no call has succeeded yet. Returns immediately
    /// once initialized.
    pub async fn init(&self) {
        if self.is_initialized() {
            return;
        }
        if !self.inner.is_available() {
            info!("waiting for server to become available");
            self.inner.ensure_recovery();
        }
        self.wait_available().await;
        self.inner.initialized.store(true, Ordering::SeqCst);
        info!("supervisor initialized");
    }

    /// Run `f` against the client and observe the outcome.
    ///
    /// On failure `notify_error` and `restore` run before the status is
    /// updated, then the original error is returned.
    pub async fn call<'a, T, F, Fut>(&'a self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&'a C) -> Fut,
        Fut: Future<Output = Result<T, Error>> + 'a,
    {
        let outcome = self.inner.observe(Origin::Call, f(&self.inner.client)).await;
        if outcome.outage && self.inner.should_recover() {
            self.inner.ensure_recovery();
        }
        outcome.result
    }

    /// Probe the server once, outside the recovery loop.
    pub async fn ping(&self) -> Result<(), Error> {
        let outcome = self
            .inner
            .observe(Origin::Probe, self.inner.client.ping())
            .await;
        if outcome.outage && self.inner.should_recover() {
            self.inner.ensure_recovery();
        }
        outcome.result
    }

    /// Resolve once the connection is available.
    pub async fn wait_available(&self) {
        let mut status = self.inner.status.subscribe();
        // The sender lives in `inner`, so the channel cannot close here.
        let _ = status.wait_for(|s| s.available).await;
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> ConnStatus {
        self.inner.status.borrow().clone()
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<ConnStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    /// Whether a recovery loop is currently scheduled or running.
    pub fn is_recovering(&self) -> bool {
        self.inner.recovering.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    /// The supervised client. Calls made directly on it are not observed.
    pub fn get_ref(&self) -> &C {
        &self.inner.client
    }
}

impl<C: Supervised> Drop for Supervisor<C> {
    fn drop(&mut self) {
        self.inner.shutdown.send_replace(true);
    }
}

impl<C: Supervised> std::fmt::Debug for Supervisor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.inner.config)
            .field("status", &*self.inner.status.borrow())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
