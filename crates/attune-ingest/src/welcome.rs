//! Welcome-DM delivery (§4.10/§5): a 3.5s defer after `memberJoin`, a
//! single retry on a transient failure, and a strict global drain rate
//! of 1 message per 1.2s so the platform's DM rate limit is never hit.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use attune_core::{PlatformActions, PlatformErrorKind, UserId};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const JOIN_DEFER_SECS: u64 = 3500;

#[derive(Debug, Clone)]
struct WelcomeJob {
    user_id: UserId,
    content: String,
    retried: bool,
}

/// Outstanding `enqueue_after_join` defer tasks and `deliver` retry
/// tasks, tracked so the drain task can join every one of them on its
/// own shutdown rather than abandon them (§9 — no task is fire-and-forget).
type TaskList = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Owns the bounded job queue, the fixed-rate drain task, and every
/// task it has spawned off of it. Cloning is cheap — all clones share
/// the same sender and task list.
#[derive(Clone)]
pub struct WelcomeDmQueue {
    sender: mpsc::Sender<WelcomeJob>,
    tasks: TaskList,
}

impl WelcomeDmQueue {
    /// Spawns the defer-and-enqueue task plus the drain task, returning
    /// a handle new `memberJoin` events can enqueue through and the
    /// drain task's `JoinHandle` so the caller can join it at shutdown
    /// rather than abandon it. The drain task itself joins every
    /// defer/retry task it and `enqueue_after_join` have spawned before
    /// it returns.
    pub fn spawn(
        actions: Arc<dyn PlatformActions>,
        rate: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<WelcomeJob>(1024);
        let tasks: TaskList = Arc::new(Mutex::new(Vec::new()));
        let queue = Self {
            sender: tx,
            tasks: Arc::clone(&tasks),
        };

        let drain = tokio::spawn(async move {
            info!("welcome dm queue drain started");
            let mut ticker = tokio::time::interval(rate);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match rx.try_recv() {
                            Ok(job) => deliver(&*actions, job, tx_for_retry(&actions), &tasks).await,
                            Err(mpsc::error::TryRecvError::Empty) => {}
                            Err(mpsc::error::TryRecvError::Disconnected) => break,
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("welcome dm queue drain shutting down");
                            break;
                        }
                    }
                }
            }
            join_tracked(&tasks).await;
        });

        (queue, drain)
    }

    /// Wait `JOIN_DEFER_SECS`, then enqueue a welcome DM job for
    /// `user_id`. Spawned as its own task so the caller doesn't block;
    /// the handle is tracked so the drain task joins it at shutdown.
    pub fn enqueue_after_join(&self, user_id: UserId, content: String) {
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(JOIN_DEFER_SECS)).await;
            if sender
                .send(WelcomeJob {
                    user_id,
                    content,
                    retried: false,
                })
                .await
                .is_err()
            {
                warn!("welcome dm queue closed, dropping join job");
            }
        });
        track(&self.tasks, handle);
    }
}

/// Push `handle` onto the shared task list, first dropping any entries
/// that have already finished so the list doesn't grow unbounded.
fn track(tasks: &TaskList, handle: JoinHandle<()>) {
    let mut guard = tasks.lock().unwrap();
    guard.retain(|h| !h.is_finished());
    guard.push(handle);
}

async fn join_tracked(tasks: &TaskList) {
    let handles: Vec<_> = tasks.lock().unwrap().drain(..).collect();
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "welcome dm task panicked");
        }
    }
}

fn tx_for_retry(actions: &Arc<dyn PlatformActions>) -> Arc<dyn PlatformActions> {
    Arc::clone(actions)
}

async fn deliver(
    actions: &dyn PlatformActions,
    job: WelcomeJob,
    retry_actions: Arc<dyn PlatformActions>,
    tasks: &TaskList,
) {
    match actions.send_dm(job.user_id, &job.content).await {
        Ok(()) => {}
        Err(PlatformErrorKind::Forbidden) => {
            info!(user = %job.user_id, "welcome dm skipped, dms_disabled");
        }
        Err(e) if !job.retried => {
            warn!(error = %e, user = %job.user_id, "welcome dm failed, retrying once");
            let handle = tokio::spawn(async move {
                if let Err(e) = retry_actions.send_dm(job.user_id, &job.content).await {
                    warn!(error = %e, user = %job.user_id, "welcome dm retry failed");
                }
            });
            track(tasks, handle);
        }
        Err(e) => {
            warn!(error = %e, user = %job.user_id, "welcome dm failed after retry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attune_core::{ChannelId, GuildId, MessageId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingActions {
        sends: AtomicUsize,
        fail_forbidden: bool,
    }

    #[async_trait]
    impl PlatformActions for CountingActions {
        async fn send_message(&self, _: ChannelId, _: &str, _: Option<MessageId>) -> Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn send_dm(&self, _user_id: UserId, _content: &str) -> Result<(), PlatformErrorKind> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail_forbidden {
                Err(PlatformErrorKind::Forbidden)
            } else {
                Ok(())
            }
        }
        async fn apply_timeout(&self, _: UserId, _: GuildId, _: u64) -> Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn apply_ban(&self, _: UserId, _: GuildId, _: Option<u64>, _: &str) -> Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn apply_kick(&self, _: UserId, _: GuildId, _: &str) -> Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn remove_role(&self, _: UserId, _: GuildId, _: &str) -> Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn add_role(&self, _: UserId, _: GuildId, _: &str) -> Result<(), PlatformErrorKind> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn forbidden_response_does_not_retry() {
        let actions = Arc::new(CountingActions { sends: AtomicUsize::new(0), fail_forbidden: true });
        let (_tx, shutdown) = watch::channel(false);
        let job = WelcomeJob { user_id: UserId::new(1), content: "hi".to_string(), retried: false };
        let tasks: TaskList = Arc::new(Mutex::new(Vec::new()));
        deliver(&*actions, job, Arc::clone(&actions) as Arc<dyn PlatformActions>, &tasks).await;
        drop(shutdown);
        assert_eq!(actions.sends.load(Ordering::SeqCst), 1);
    }
}
