//! Concurrent delivery of reminders.
//!
//! Every (reminder, assignee) pair becomes one delivery unit. Units are fed
//! through a bounded queue to a fixed set of worker tasks that share the
//! transport. Each unit is retried on rate limits, rerouted once to the
//! fallback channel when its recipient no longer exists, and otherwise
//! succeeds or fails on its own.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, instrument, warn, Instrument, Span};

use nudge_core::emit_delivery_finished;

use crate::deep_link::DeepLinkConfig;
use crate::error::{Result, TransportError};
use crate::message::{DeliveryTarget, Reminder};
use crate::transport::Transport;

/// Rate-limit handling for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included.
    pub max_attempts: u32,
    /// Lower bound of the wait between attempts.
    pub min_delay: Duration,
    /// Upper bound of the wait between attempts.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT: Self = Self {
        max_attempts: 5,
        min_delay: Duration::from_secs(30),
        max_delay: Duration::from_secs(600),
    };

    /// Wait before the next attempt: `Retry-After` clamped to the bounds.
    pub fn delay_for(&self, retry_after: Option<Duration>) -> Duration {
        let max = self.max_delay.max(self.min_delay);
        retry_after.unwrap_or(self.min_delay).clamp(self.min_delay, max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Channel that receives units whose recipient is gone.
    pub fallback_channel: Option<String>,
    /// Number of worker tasks.
    pub workers: usize,
    /// Capacity of the unit queue.
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
    pub deep_link: Option<DeepLinkConfig>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            fallback_channel: None,
            workers,
            queue_capacity: workers * 4,
            retry: RetryPolicy::default(),
            deep_link: None,
        }
    }
}

impl DispatchConfig {
    pub fn with_fallback_channel(mut self, channel: &str) -> Self {
        self.fallback_channel = Some(channel.to_string());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self.queue_capacity = self.workers * 4;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_deep_link(mut self, deep_link: Option<DeepLinkConfig>) -> Self {
        self.deep_link = deep_link;
        self
    }
}

/// Outcome of one delivery unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub assignee: String,
    pub file: String,
    /// Where the message went, or was last attempted.
    pub target: Option<DeliveryTarget>,
    /// Transport calls made for this unit, retries included.
    pub attempts: u32,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

struct DeliveryUnit {
    index: usize,
    reminder: Arc<Reminder>,
    assignee: String,
}

/// Fans reminders out to their assignees.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    config: Arc<DispatchConfig>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, config: DispatchConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deliver every reminder to every assignee.
    ///
    /// Returns one report per unit, in reminder then assignee order. Returns
    /// only after every unit has succeeded or definitively failed.
    #[instrument(skip_all, fields(transport = self.transport.name(), reminders = reminders.len()))]
    pub async fn dispatch(&self, reminders: Vec<Reminder>) -> Vec<DeliveryReport> {
        let units: Vec<DeliveryUnit> = reminders
            .into_iter()
            .map(Arc::new)
            .flat_map(|reminder| {
                reminder
                    .assignees
                    .clone()
                    .into_iter()
                    .map(move |assignee| (Arc::clone(&reminder), assignee))
            })
            .enumerate()
            .map(|(index, (reminder, assignee))| DeliveryUnit {
                index,
                reminder,
                assignee,
            })
            .collect();
        let total = units.len();
        if total == 0 {
            return Vec::new();
        }
        let slots: Vec<(String, String)> = units
            .iter()
            .map(|unit| (unit.assignee.clone(), unit.reminder.file.clone()))
            .collect();

        let (tx, rx) = mpsc::channel::<DeliveryUnit>(self.config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let workers = self.config.workers.clamp(1, total);

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let rx = Arc::clone(&rx);
            let dispatcher = self.clone();
            let task = async move {
                let mut done = Vec::new();
                loop {
                    let unit = { rx.lock().await.recv().await };
                    let Some(unit) = unit else { break };
                    debug!(worker, assignee = %unit.assignee, "delivering");
                    let report = dispatcher.deliver(&unit.reminder, &unit.assignee).await;
                    done.push((unit.index, report));
                }
                done
            };
            handles.push(tokio::spawn(task.instrument(Span::current())));
        }
        // Only workers hold the receiver, so sends fail once they are all gone.
        drop(rx);

        let mut lost = "delivery workers stopped early".to_string();
        for unit in units {
            if tx.send(unit).await.is_err() {
                error!("{lost}");
                break;
            }
        }
        drop(tx);

        let mut finished: Vec<(usize, DeliveryReport)> = Vec::with_capacity(total);
        for handle in handles {
            match handle.await {
                Ok(done) => finished.extend(done),
                Err(e) => {
                    error!(error = %e, "delivery worker failed");
                    lost = format!("delivery worker failed: {e}");
                }
            }
        }
        collect_reports(slots, finished, &lost)
    }

    /// Deliver `reminder` to a single assignee.
    pub async fn deliver(&self, reminder: &Reminder, assignee: &str) -> DeliveryReport {
        let mut attempts = 0;
        let result = self.deliver_inner(reminder, assignee, &mut attempts).await;

        let (target, error) = match result {
            Ok(target) => (Some(target), None),
            Err((target, e)) => (target, Some(e)),
        };
        emit_delivery_finished(
            assignee,
            target.as_ref().map(DeliveryTarget::id).unwrap_or("-"),
            attempts,
            error.as_deref(),
        );

        DeliveryReport {
            assignee: assignee.to_string(),
            file: reminder.file.clone(),
            target,
            attempts,
            error,
        }
    }

    async fn deliver_inner(
        &self,
        reminder: &Reminder,
        assignee: &str,
        attempts: &mut u32,
    ) -> std::result::Result<DeliveryTarget, (Option<DeliveryTarget>, String)> {
        let target = match self.resolve(assignee, attempts).await {
            Ok(target) => target,
            Err(e) if e.is_not_found() => self
                .fallback_target(assignee)
                .ok_or_else(|| (None, self.unreachable(assignee, &e)))?,
            Err(e) => return Err((None, format!("Error finding user or channel `{assignee}`: {e}"))),
        };

        match self.post(reminder, &target, attempts).await {
            Ok(()) => Ok(target),
            Err(e) if e.is_not_found() && !matches!(target, DeliveryTarget::FallbackChannel { .. }) => {
                let fallback = self
                    .fallback_target(assignee)
                    .ok_or_else(|| (Some(target.clone()), self.unreachable(assignee, &e)))?;
                self.post(reminder, &fallback, attempts)
                    .await
                    .map(|()| fallback.clone())
                    .map_err(|e| {
                        (
                            Some(fallback.clone()),
                            format!("Error dispatching message for `{assignee}` to the fallback channel: {e}"),
                        )
                    })
            }
            Err(e) => Err((
                Some(target),
                format!("Error dispatching message for `{assignee}`: {e}"),
            )),
        }
    }

    fn unreachable(&self, assignee: &str, e: &TransportError) -> String {
        format!("`{assignee}` cannot be reached ({e}) and no fallback channel is configured")
    }

    fn fallback_target(&self, assignee: &str) -> Option<DeliveryTarget> {
        let channel = self.config.fallback_channel.as_ref()?;
        warn!(assignee = %assignee, fallback = %channel, "rerouting to fallback channel");
        Some(DeliveryTarget::FallbackChannel {
            id: channel.clone(),
            original_assignee: assignee.to_string(),
        })
    }

    /// Anything containing `@` names a user to look up; the rest are channel ids.
    async fn resolve(&self, assignee: &str, attempts: &mut u32) -> Result<DeliveryTarget> {
        if !assignee.contains('@') {
            return Ok(DeliveryTarget::Channel {
                id: assignee.to_string(),
            });
        }

        let recipient = self
            .with_retry(attempts, || self.transport.lookup_user(assignee))
            .await?;
        Ok(DeliveryTarget::User {
            id: recipient.id,
            display_name: recipient.display_name,
        })
    }

    async fn post(&self, reminder: &Reminder, target: &DeliveryTarget, attempts: &mut u32) -> Result<()> {
        let text = reminder.render(target, self.config.deep_link.as_ref());
        self.with_retry(attempts, || self.transport.post_message(target.id(), &text))
            .await
    }

    async fn with_retry<T, F, Fut>(&self, attempts: &mut u32, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = self.config.retry;
        let mut tries = 0;
        loop {
            tries += 1;
            *attempts += 1;
            match op().await {
                Err(TransportError::RateLimited { retry_after }) if tries < policy.max_attempts => {
                    let delay = policy.delay_for(retry_after);
                    warn!(delay_ms = delay.as_millis() as u64, attempt = tries, "rate limited, sleeping");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

/// Order finished reports by unit index. Units whose worker died before
/// reporting come back as failures carrying `lost`.
fn collect_reports(
    slots: Vec<(String, String)>,
    finished: Vec<(usize, DeliveryReport)>,
    lost: &str,
) -> Vec<DeliveryReport> {
    let mut reports: Vec<Option<DeliveryReport>> = vec![None; slots.len()];
    for (index, report) in finished {
        if let Some(slot) = reports.get_mut(index) {
            *slot = Some(report);
        }
    }
    reports
        .into_iter()
        .zip(slots)
        .map(|(report, (assignee, file))| {
            report.unwrap_or_else(|| DeliveryReport {
                assignee,
                file,
                target: None,
                attempts: 0,
                error: Some(lost.to_string()),
            })
        })
        .collect()
}
