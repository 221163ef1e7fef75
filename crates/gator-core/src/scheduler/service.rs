use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::feed::FeedFetcher;
use crate::storage::Database;
use crate::{Error, Result};

use super::tasks::{scrape_next_feed, CycleOutcome};

/// Events emitted after every poll cycle
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// There was no feed to poll
    Idle,
    /// A feed was polled and its items ingested
    FeedRefreshed {
        feed_name: String,
        stored: u32,
        skipped: u32,
    },
    /// The cycle ended early; the feed stays marked as fetched
    Error { message: String },
}

/// Fixed-interval poller that runs one feed cycle per tick
pub struct SchedulerService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
    fetcher: FeedFetcher,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config)?;

        Ok(Self {
            db,
            config,
            fetcher,
            event_tx: None,
        })
    }

    /// Set the event sender for cycle notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Poll one feed every `interval` until shutdown is signalled.
    ///
    /// The first cycle starts immediately. A cycle that outlasts the interval
    /// delays the next tick instead of queueing extra ones. When shutdown
    /// arrives mid-cycle, the cycle gets `shutdown_grace_secs` to finish.
    pub async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::InvalidInterval {
                input: format!("{:?}", interval),
                reason: "must be positive".to_string(),
            });
        }

        let grace = Duration::from_secs(self.config.sync.shutdown_grace_secs);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Collecting feeds every {:?}", interval);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown) => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let cycle = self.run_cycle();
            tokio::pin!(cycle);

            tokio::select! {
                outcome = &mut cycle => self.report(outcome),
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown requested, letting the current cycle finish (up to {:?})", grace);
                    match tokio::time::timeout(grace, &mut cycle).await {
                        Ok(outcome) => self.report(outcome),
                        Err(_) => warn!("Cycle did not finish within {:?}, abandoning it", grace),
                    }
                    break;
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Run a single select → mark → fetch → ingest cycle
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        scrape_next_feed(&self.db, &self.fetcher).await
    }

    fn report(&self, outcome: Result<CycleOutcome>) {
        match outcome {
            Ok(CycleOutcome::Idle) => {
                debug!("No feeds to fetch");
                self.send_event(SchedulerEvent::Idle);
            }
            Ok(CycleOutcome::Ingested { feed, report }) => {
                if report.stored > 0 {
                    info!("Scheduled refresh: {} new posts from '{}'", report.stored, feed.name);
                }
                self.send_event(SchedulerEvent::FeedRefreshed {
                    feed_name: feed.name,
                    stored: report.stored,
                    skipped: report.skipped,
                });
            }
            Err(e) => {
                error!("Scheduled refresh failed: {}", e);
                self.send_event(SchedulerEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Resolves once `true` is sent; never resolves if the sender goes away
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let sender_dropped = shutdown.wait_for(|stop| *stop).await.is_err();
    if sender_dropped {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Feed, NewFeed};
    use crate::storage::{FeedRepository, UserRepository};
    use tokio::time::timeout;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMPTY_RSS: &str = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;

    async fn service() -> (Arc<Database>, SchedulerService) {
        service_with(AppConfig::default()).await
    }

    async fn service_with(config: AppConfig) -> (Arc<Database>, SchedulerService) {
        let db = Arc::new(Database::new_in_memory().await.unwrap());
        let svc = SchedulerService::new(db.clone(), Arc::new(config)).unwrap();
        (db, svc)
    }

    /// A scheduler whose single feed answers after `delay`
    async fn slow_feed_service(
        server: &MockServer,
        delay: Duration,
        grace_secs: u64,
    ) -> (Arc<Database>, Feed, SchedulerService) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_RSS).set_delay(delay))
            .mount(server)
            .await;

        let mut config = AppConfig::default();
        config.sync.shutdown_grace_secs = grace_secs;
        config.sync.request_timeout_secs = 60;

        let (db, svc) = service_with(config).await;
        let user = UserRepository::new(&db).create("kahya").await.unwrap();
        let feed = FeedRepository::new(&db)
            .create(&NewFeed {
                name: "slow".to_string(),
                url: format!("{}/slow", server.uri()),
                user_id: user.id,
            })
            .await
            .unwrap();
        (db, feed, svc)
    }

    async fn wait_for_request(server: &MockServer) {
        timeout(Duration::from_secs(5), async {
            while server.received_requests().await.map_or(0, |r| r.len()) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let (_db, svc) = service().await;
        let (_tx, rx) = watch::channel(false);
        let result = svc.run(Duration::ZERO, rx).await;
        assert!(matches!(result, Err(Error::InvalidInterval { .. })));
    }

    #[tokio::test]
    async fn test_scheduler_shutdown() {
        let (_db, svc) = service().await;
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(svc.with_event_sender(event_tx).run(Duration::from_secs(3600), shutdown_rx));

        // First tick fires immediately; with no feeds the cycle is idle
        let event = timeout(Duration::from_secs(5), event_rx.recv()).await.unwrap();
        assert!(matches!(event, Some(SchedulerEvent::Idle)));

        shutdown_tx.send(true).unwrap();
        let result = timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_each_tick_polls_next_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_RSS))
            .mount(&server)
            .await;

        let (db, svc) = service().await;
        let user = UserRepository::new(&db).create("kahya").await.unwrap();
        for name in ["a", "b", "c"] {
            FeedRepository::new(&db)
                .create(&NewFeed {
                    name: name.to_string(),
                    url: format!("{}/{}", server.uri(), name),
                    user_id: user.id,
                })
                .await
                .unwrap();
        }

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(svc.with_event_sender(event_tx).run(Duration::from_millis(20), shutdown_rx));

        let mut polled = Vec::new();
        while polled.len() < 3 {
            match timeout(Duration::from_secs(5), event_rx.recv()).await.unwrap() {
                Some(SchedulerEvent::FeedRefreshed { feed_name, .. }) => polled.push(feed_name),
                other => panic!("Unexpected event: {:?}", other),
            }
        }

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();

        polled.sort();
        assert_eq!(polled, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fetch_error_does_not_stop_loop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (db, svc) = service().await;
        let user = UserRepository::new(&db).create("kahya").await.unwrap();
        FeedRepository::new(&db)
            .create(&NewFeed {
                name: "gone".to_string(),
                url: format!("{}/gone", server.uri()),
                user_id: user.id,
            })
            .await
            .unwrap();

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(svc.with_event_sender(event_tx).run(Duration::from_millis(20), shutdown_rx));

        for _ in 0..2 {
            let event = timeout(Duration::from_secs(5), event_rx.recv()).await.unwrap();
            assert!(matches!(event, Some(SchedulerEvent::Error { .. })));
        }

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_lets_cycle_finish_within_grace() {
        let server = MockServer::start().await;
        let (_db, _feed, svc) = slow_feed_service(&server, Duration::from_millis(300), 10).await;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(svc.with_event_sender(event_tx).run(Duration::from_secs(3600), shutdown_rx));

        wait_for_request(&server).await;
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();

        match event_rx.recv().await {
            Some(SchedulerEvent::FeedRefreshed { feed_name, .. }) => assert_eq!(feed_name, "slow"),
            other => panic!("Expected FeedRefreshed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_abandons_cycle_after_grace() {
        let server = MockServer::start().await;
        let (db, feed, svc) = slow_feed_service(&server, Duration::from_secs(30), 1).await;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(svc.with_event_sender(event_tx).run(Duration::from_secs(3600), shutdown_rx));

        wait_for_request(&server).await;
        let started = std::time::Instant::now();
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(10), handle).await.unwrap().unwrap().unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(900), "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "returned after {:?}", elapsed);

        // The abandoned cycle reports nothing, but its feed stays marked
        assert!(event_rx.recv().await.is_none());
        let marked = FeedRepository::new(&db).find_by_id(feed.id).await.unwrap().unwrap();
        assert!(marked.last_fetched_at.is_some());
    }
}
