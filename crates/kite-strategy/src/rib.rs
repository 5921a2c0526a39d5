//! RIB control plane
//!
//! Route announcements and withdrawals never run on the forwarding path.
//! The strategy holds a [`RibHandle`] and enqueues [`RibCommand`]s; a
//! [`RibTask`] drains them on its own tokio task against a [`RibService`]
//! and logs each result.
//!
//! Handles:
//! - Announcing mobility routes learned from acknowledgments
//! - Withdrawing routes that produced a NACK
//! - Optional per-command result delivery over a oneshot channel

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use kite_core::{FaceId, ForwardingError, Name, PrefixAnnouncement};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::StrategyError;

/// Outcome of a self-learning announce or renew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnounceResult {
    Ok,
    InvalidSignature,
    OutOfRange,
    NotFound,
    ValidationFailure,
    Expired,
}

impl AnnounceResult {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for AnnounceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationFailure => "VALIDATION_FAILURE",
            Self::Expired => "EXPIRED",
        };
        write!(f, "{}", s)
    }
}

/// Route registry that accepts prefix announcements
#[async_trait]
pub trait RibService: Send + Sync {
    /// Install or refresh a route from a prefix announcement
    async fn announce(
        &self,
        announcement: &PrefixAnnouncement,
        face: FaceId,
        validity: Duration,
    ) -> AnnounceResult;

    /// Renew a route. A zero validity removes it.
    async fn renew(&self, name: &Name, face: FaceId, validity: Duration) -> AnnounceResult;
}

/// A route learned from a prefix announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RibRoute {
    pub name: Name,
    pub face: FaceId,
    pub expires_at: DateTime<Utc>,
    /// Upper bound set by the announcement's own expiration
    pub announced_until: DateTime<Utc>,
}

/// In-memory [`RibService`]
#[derive(Debug, Default)]
pub struct MemoryRib {
    routes: DashMap<(Name, FaceId), RibRoute>,
}

impl MemoryRib {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, name: &Name, face: FaceId) -> Option<RibRoute> {
        self.routes
            .get(&(name.clone(), face))
            .map(|route| route.value().clone())
    }

    pub fn has_route(&self, name: &Name, face: FaceId) -> bool {
        self.routes.contains_key(&(name.clone(), face))
    }

    pub fn routes(&self) -> Vec<RibRoute> {
        self.routes.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Drop routes that expired before `now`
    pub fn cleanup(&self, now: DateTime<Utc>) -> usize {
        let before = self.routes.len();
        self.routes.retain(|_, route| route.expires_at > now);
        before - self.routes.len()
    }
}

fn deadline(now: DateTime<Utc>, after: Duration) -> Option<DateTime<Utc>> {
    let delta = chrono::Duration::from_std(after).ok()?;
    now.checked_add_signed(delta)
}

#[async_trait]
impl RibService for MemoryRib {
    async fn announce(
        &self,
        announcement: &PrefixAnnouncement,
        face: FaceId,
        validity: Duration,
    ) -> AnnounceResult {
        if announcement.expiration.is_zero() {
            return AnnounceResult::Expired;
        }
        let now = Utc::now();
        let (Some(announced_until), Some(valid_until)) = (
            deadline(now, announcement.expiration),
            deadline(now, validity),
        ) else {
            return AnnounceResult::OutOfRange;
        };

        let name = announcement.announced_name.clone();
        self.routes.insert(
            (name.clone(), face),
            RibRoute {
                name,
                face,
                expires_at: valid_until.min(announced_until),
                announced_until,
            },
        );
        AnnounceResult::Ok
    }

    async fn renew(&self, name: &Name, face: FaceId, validity: Duration) -> AnnounceResult {
        let key = (name.clone(), face);
        if validity.is_zero() {
            return match self.routes.remove(&key) {
                Some(_) => AnnounceResult::Ok,
                None => AnnounceResult::NotFound,
            };
        }

        let Some(mut route) = self.routes.get_mut(&key) else {
            return AnnounceResult::NotFound;
        };
        let Some(valid_until) = deadline(Utc::now(), validity) else {
            return AnnounceResult::OutOfRange;
        };
        route.expires_at = valid_until.min(route.announced_until);
        AnnounceResult::Ok
    }
}

/// A request for the control-plane task
#[derive(Debug)]
pub enum RibCommand {
    Announce {
        announcement: PrefixAnnouncement,
        face: FaceId,
        validity: Duration,
        reply: Option<oneshot::Sender<AnnounceResult>>,
    },
    Withdraw {
        name: Name,
        face: FaceId,
        validity: Duration,
        reply: Option<oneshot::Sender<AnnounceResult>>,
    },
}

/// Sending half of the control plane, held by the strategy
#[derive(Debug, Clone)]
pub struct RibHandle {
    tx: mpsc::UnboundedSender<RibCommand>,
}

impl RibHandle {
    /// Create a handle and the receiver a consumer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RibCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a handle served by a [`RibTask`] over `service`
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<S>(service: Arc<S>, shutdown_rx: broadcast::Receiver<()>) -> (Self, JoinHandle<()>)
    where
        S: RibService + 'static,
    {
        let (handle, rx) = Self::channel();
        let task = RibTask::spawn(service, rx, shutdown_rx);
        (handle, task)
    }

    /// Queue a route announcement. Never blocks.
    pub fn announce(&self, announcement: PrefixAnnouncement, face: FaceId, validity: Duration) {
        let name = announcement.announced_name.clone();
        self.submit(
            "announce",
            name,
            RibCommand::Announce {
                announcement,
                face,
                validity,
                reply: None,
            },
        );
    }

    /// Queue a route withdrawal. Never blocks.
    pub fn withdraw(&self, name: Name, face: FaceId, validity: Duration) {
        self.submit(
            "withdraw",
            name.clone(),
            RibCommand::Withdraw {
                name,
                face,
                validity,
                reply: None,
            },
        );
    }

    /// Queue an announcement and get its result later
    pub fn announce_with_reply(
        &self,
        announcement: PrefixAnnouncement,
        face: FaceId,
        validity: Duration,
    ) -> Result<oneshot::Receiver<AnnounceResult>, StrategyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RibCommand::Announce {
                announcement,
                face,
                validity,
                reply: Some(reply),
            })
            .map_err(|_| StrategyError::ControlPlaneClosed)?;
        Ok(rx)
    }

    /// Queue a withdrawal and get its result later
    pub fn withdraw_with_reply(
        &self,
        name: Name,
        face: FaceId,
        validity: Duration,
    ) -> Result<oneshot::Receiver<AnnounceResult>, StrategyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RibCommand::Withdraw {
                name,
                face,
                validity,
                reply: Some(reply),
            })
            .map_err(|_| StrategyError::ControlPlaneClosed)?;
        Ok(rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn submit(&self, operation: &'static str, name: Name, command: RibCommand) {
        if self.tx.send(command).is_err() {
            warn!(
                operation,
                name = %name,
                error = %StrategyError::ControlPlaneClosed,
                "Dropping RIB command"
            );
        }
    }
}

/// Consumer loop applying [`RibCommand`]s to a [`RibService`]
pub struct RibTask<S: RibService> {
    service: Arc<S>,
    rx: mpsc::UnboundedReceiver<RibCommand>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl<S: RibService + 'static> RibTask<S> {
    pub fn new(
        service: Arc<S>,
        rx: mpsc::UnboundedReceiver<RibCommand>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            service,
            rx,
            shutdown_rx,
        }
    }

    /// Spawn the task as a background task
    pub fn spawn(
        service: Arc<S>,
        rx: mpsc::UnboundedReceiver<RibCommand>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let task = Self::new(service, rx, shutdown_rx);
        tokio::spawn(async move {
            task.run().await;
        })
    }

    async fn run(mut self) {
        info!("RIB task started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("RIB task shutting down");
                    break;
                }
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.handle(command).await,
                        None => {
                            info!("RIB command channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, command: RibCommand) {
        match command {
            RibCommand::Announce {
                announcement,
                face,
                validity,
                reply,
            } => {
                let result = self.service.announce(&announcement, face, validity).await;
                log_result("announce", &announcement.announced_name, face, result);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            RibCommand::Withdraw {
                name,
                face,
                validity,
                reply,
            } => {
                let result = self.service.renew(&name, face, validity).await;
                log_result("withdraw", &name, face, result);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
        }
    }
}

fn log_result(operation: &'static str, name: &Name, face: FaceId, result: AnnounceResult) {
    if result.is_ok() {
        debug!(operation, name = %name, face = %face, %result, "RIB route updated");
    } else {
        let error = ForwardingError::AsyncControlPlaneFailure {
            operation,
            name: name.clone(),
            result: result.to_string(),
        };
        warn!(face = %face, error = %error, "RIB route update failed");
    }
}
