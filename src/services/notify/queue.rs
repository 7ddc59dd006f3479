use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Notifier;

#[derive(Debug, Clone)]
pub struct Notification {
    pub channel: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Sending half of the outbound notification channel. Delivery happens on a
/// background task, so enqueueing never waits on the network.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    pub fn spawn(
        notifier: Arc<dyn Notifier>,
        policy: RetryPolicy,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(rx, notifier, policy));
        (Self { tx }, handle)
    }

    pub fn enqueue(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                tracing::warn!(channel = %n.channel, "notification queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                tracing::error!(channel = %n.channel, "notification worker stopped, dropping message");
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Notification>,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
) {
    while let Some(notification) = rx.recv().await {
        deliver(notifier.as_ref(), &notification, policy).await;
    }
    tracing::debug!("notification worker shutting down");
}

async fn deliver(notifier: &dyn Notifier, notification: &Notification, policy: RetryPolicy) {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match notifier
            .send(&notification.channel, &notification.message)
            .await
        {
            Ok(()) => {
                tracing::debug!(channel = %notification.channel, attempt, "notification delivered");
                return;
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(channel = %notification.channel, attempt, error = %e, "notification failed, retrying");
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                tracing::error!(channel = %notification.channel, attempts, error = %e, "notification dropped after retries");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FlakyNotifier {
        failures_left: Mutex<u32>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FlakyNotifier {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                sent: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, channel: &str, message: &str) -> anyhow::Result<()> {
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    anyhow::bail!("temporary failure");
                }
            }
            self.sent
                .lock()
                .unwrap()
                .push((channel.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(0),
        }
    }

    fn notification(text: &str) -> Notification {
        Notification {
            channel: "12345".to_string(),
            message: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_delivers_after_transient_failures() {
        let notifier = Arc::new(FlakyNotifier::new(2));
        let (queue, handle) = NotificationQueue::spawn(notifier.clone(), fast_policy(3), 8);

        queue.enqueue(notification("New booking"));
        drop(queue);
        handle.await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("12345".to_string(), "New booking".to_string()));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let notifier = Arc::new(FlakyNotifier::new(5));
        let (queue, handle) = NotificationQueue::spawn(notifier.clone(), fast_policy(3), 8);

        queue.enqueue(notification("first"));
        queue.enqueue(notification("second"));
        drop(queue);
        handle.await.unwrap();

        // Three attempts burned on "first", two more on "second", then success
        assert_eq!(*notifier.failures_left.lock().unwrap(), 0);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "second");
    }
}
