//! Client-local notification feed.
//!
//! The server never pushes; polling clients (the admin console) re-fetch the
//! newest messages on a fixed interval and derive transient notifications
//! from the ids they have not seen before. The `read` flag here is purely
//! client-side and is never reconciled with the message's own status column.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::warn;
use url::Url;

use crate::models::message::{Message, MessagePriority, MessagesPage};

/// How loudly the UI should surface a new message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    Normal,
    Urgent,
}

pub fn alert_for(priority: MessagePriority) -> Alert {
    match priority {
        MessagePriority::Urgent | MessagePriority::High => Alert::Urgent,
        MessagePriority::Low | MessagePriority::Normal => Alert::Normal,
    }
}

/// A message wrapped with client-local read state. Not persisted anywhere.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: Message,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn alert(&self) -> Alert {
        alert_for(self.message.priority)
    }
}

/// Seen-id set plus the accumulated notification list.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    seen: HashSet<String>,
    notifications: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff a fetched page against every id seen so far. Each previously
    /// unseen message becomes a notification; the new ones are returned so
    /// the caller can raise alerts.
    pub fn absorb(&mut self, page: &[Message]) -> Vec<Notification> {
        let mut fresh = Vec::new();
        for message in page {
            if self.seen.insert(message.id.clone()) {
                let notification = Notification {
                    message: message.clone(),
                    read: false,
                    created_at: Utc::now(),
                };
                fresh.push(notification.clone());
                self.notifications.push(notification);
            }
        }
        fresh
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Mark one notification read. Returns false for an unknown message id.
    pub fn mark_read(&mut self, message_id: &str) -> bool {
        match self
            .notifications
            .iter_mut()
            .find(|n| n.message.id == message_id)
        {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the console server.
    pub base_url: Url,
    pub interval: Duration,
    /// How many of the newest messages each poll fetches.
    pub page_limit: u32,
}

/// Owns the background poll task; dropping it stops polling. A response in
/// flight at teardown is dropped with the task.
pub struct FeedHandle {
    task: tokio::task::JoinHandle<()>,
}

impl FeedHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the fixed-interval poll loop. New notifications arrive on the
/// returned channel; poll failures are logged and the next tick retries from
/// scratch (there is no retry inside a tick).
pub fn spawn_poller(
    http: reqwest::Client,
    cfg: FeedConfig,
) -> (mpsc::UnboundedReceiver<Notification>, FeedHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let mut feed = NotificationFeed::new();
        let mut ticker = tokio::time::interval(cfg.interval);
        // A fetch that overruns the interval drops the missed tick instead
        // of queueing a burst behind it.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match fetch_page(&http, &cfg).await {
                Ok(page) => {
                    for notification in feed.absorb(&page) {
                        if tx.send(notification).is_err() {
                            // Consumer is gone; stop polling.
                            return;
                        }
                    }
                }
                Err(err) => warn!("Message poll failed: {err}"),
            }
        }
    });
    (rx, FeedHandle { task })
}

async fn fetch_page(http: &reqwest::Client, cfg: &FeedConfig) -> Result<Vec<Message>, String> {
    let mut url = cfg.base_url.join("/messages").map_err(|e| e.to_string())?;
    url.query_pairs_mut()
        .append_pair("limit", &cfg.page_limit.to_string());
    let res = http
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request error: {e}"))?;
    if !res.status().is_success() {
        return Err(format!("messages status {}", res.status()));
    }
    let page = res
        .json::<MessagesPage>()
        .await
        .map_err(|e| format!("json error: {e}"))?;
    Ok(page.messages)
}
