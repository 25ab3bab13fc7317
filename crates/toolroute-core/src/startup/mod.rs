//! Startup orchestrator
//!
//! Drives bring-up through four phases (configuration, connection, tool
//! discovery, keyword indexing), publishing an immutable status snapshot
//! after each one. Phase failures never propagate as errors; they are
//! folded into the snapshot and a background retry is scheduled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;

use crate::config::{validate_servers, ServerConfigProvider, ToolMetadataStore};
use crate::logging::SharedLogger;
use crate::manager::ConnectionManager;
use crate::matcher::KeywordIndex;
use crate::types::{InitializationStatus, StatusDetails};

/// Retry delay after a run that left some phase incomplete
pub const PARTIAL_FAILURE_RETRY: Duration = Duration::from_secs(5);

/// Retry delay after a storage failure in the index phase
pub const INDEX_FAILURE_RETRY: Duration = Duration::from_secs(10);

/// Optional delay (milliseconds) before the first bring-up
const STARTUP_DELAY_ENV: &str = "TOOLROUTE_STARTUP_DELAY_MS";

/// What the orchestrator should do after a run completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPlan {
    None,
    Partial,
    Index,
}

/// An in-flight bring-up run, awaitable by any number of callers
type RunHandle = Shared<BoxFuture<'static, Arc<InitializationStatus>>>;

/// Serialized, re-entrant bring-up over shared manager and index handles
pub struct StartupOrchestrator {
    manager: Arc<ConnectionManager>,
    servers: Arc<dyn ServerConfigProvider>,
    metadata: Arc<dyn ToolMetadataStore>,
    index: Arc<parking_lot::RwLock<KeywordIndex>>,
    status: parking_lot::RwLock<Arc<InitializationStatus>>,
    inflight: parking_lot::Mutex<Option<RunHandle>>,
    initializing: AtomicBool,
    retry: parking_lot::Mutex<Option<JoinHandle<()>>>,
    logger: SharedLogger,
}

impl StartupOrchestrator {
    /// Assemble an orchestrator; no phase runs until `initialize`
    pub fn new(
        manager: Arc<ConnectionManager>,
        servers: Arc<dyn ServerConfigProvider>,
        metadata: Arc<dyn ToolMetadataStore>,
        index: Arc<parking_lot::RwLock<KeywordIndex>>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            manager,
            servers,
            metadata,
            index,
            status: parking_lot::RwLock::new(Arc::new(InitializationStatus::pending())),
            inflight: parking_lot::Mutex::new(None),
            initializing: AtomicBool::new(false),
            retry: parking_lot::Mutex::new(None),
            logger,
        }
    }

    /// Current status snapshot, without triggering a run
    pub fn status(&self) -> Arc<InitializationStatus> {
        self.status.read().clone()
    }

    /// Whether a bring-up run is in flight right now
    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::SeqCst)
    }

    /// First bring-up, honoring the optional startup delay
    pub async fn start(self: &Arc<Self>) -> Arc<InitializationStatus> {
        if let Some(delay) = startup_delay() {
            self.logger.info(&format!(
                "[Startup] Delaying bring-up by {} ms ({})",
                delay.as_millis(),
                STARTUP_DELAY_ENV
            ));
            tokio::time::sleep(delay).await;
        }
        self.initialize(false).await
    }

    /// Run bring-up, or return the existing result
    ///
    /// Callers share one in-flight run: whoever arrives while a run is
    /// underway awaits that run's eventual snapshot instead of starting
    /// another. `force` ignores the ready cache (a forced caller arriving
    /// mid-run joins the run already underway).
    pub async fn initialize(self: &Arc<Self>, force: bool) -> Arc<InitializationStatus> {
        if !force && self.status().ready {
            return self.status();
        }

        let run = {
            let mut inflight = self.inflight.lock();
            match inflight.as_ref() {
                Some(run) => run.clone(),
                None => {
                    let this = Arc::clone(self);
                    let run: RunHandle = async move {
                        if let Some(timer) = this.retry.lock().take() {
                            timer.abort();
                        }
                        this.initializing.store(true, Ordering::SeqCst);
                        let (snapshot, plan) = this.run_phases().await;
                        this.initializing.store(false, Ordering::SeqCst);
                        this.inflight.lock().take();
                        this.schedule_retry(plan);
                        snapshot
                    }
                    .boxed()
                    .shared();
                    *inflight = Some(run.clone());
                    run
                }
            }
        };

        run.await
    }

    /// Execute the four phases, publishing a snapshot after each
    async fn run_phases(&self) -> (Arc<InitializationStatus>, RetryPlan) {
        let mut details = StatusDetails::default();

        // Phase 1: configuration.
        let configs = match self.servers.load_servers().await {
            Ok(configs) => validate_servers(configs, &self.logger),
            Err(e) => {
                self.logger.error(&format!("[Startup] Configuration load failed: {}", e));
                let snapshot = self.publish(false, false, false, false, Some(e.to_string()), details);
                return (snapshot, RetryPlan::Partial);
            }
        };
        details.total_servers = configs.len();
        self.publish(true, false, false, false, None, details.clone());

        // Phase 2: connection, with per-server isolation inside the manager.
        let connected = self.manager.connect_all(&configs).await;
        details.connected_servers = connected;
        let servers_connected = connected > 0;
        let connect_error = if servers_connected {
            None
        } else {
            Some("no server reached Connected".to_string())
        };
        self.publish(true, servers_connected, false, false, connect_error.clone(), details.clone());

        // Phase 3: discovery aggregate. Per-server discovery already ran
        // during connect; this phase judges the combined catalogue.
        let tools = self.manager.list_tools();
        details.total_tools = tools.len();
        let tools_loaded = !tools.is_empty();
        self.publish(
            true,
            servers_connected,
            tools_loaded,
            false,
            connect_error.clone(),
            details.clone(),
        );

        // Phase 4: keyword index.
        let names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
        let mappings = match self.metadata.keyword_mappings(&names).await {
            Ok(mappings) => mappings,
            Err(e) => {
                self.logger.error(&format!("[Startup] Keyword index load failed: {}", e));
                let snapshot = self.publish(
                    true,
                    servers_connected,
                    tools_loaded,
                    false,
                    Some(e.to_string()),
                    details,
                );
                return (snapshot, RetryPlan::Index);
            }
        };

        let fresh = KeywordIndex::from_mappings(&mappings);
        details.keyword_mappings = fresh.mapping_count();
        let unmapped = fresh.unmapped_tools(&names);
        for tool in &unmapped {
            self.logger.warn(&format!(
                "[Startup] Tool '{}' has no keyword mappings; only semantic matching can reach it",
                tool
            ));
        }
        *self.index.write() = fresh;

        self.apply_embeddings(&names).await;

        let keywords_mapped = tools_loaded && unmapped.is_empty();
        let snapshot = self.publish(
            true,
            servers_connected,
            tools_loaded,
            keywords_mapped,
            connect_error,
            details,
        );

        if snapshot.ready {
            self.logger.info(&format!("[Startup] {}", snapshot.message()));
            (snapshot, RetryPlan::None)
        } else {
            self.logger.warn(&format!("[Startup] {}", snapshot.message()));
            (snapshot, RetryPlan::Partial)
        }
    }

    /// Attach stored embeddings to discovered tools; failures only warn
    async fn apply_embeddings(&self, names: &[String]) {
        match self.metadata.embeddings(names).await {
            Ok(embeddings) => {
                for (tool, embedding) in embeddings {
                    self.manager.annotate_tool(&tool, Vec::new(), Some(embedding));
                }
            }
            Err(e) => {
                self.logger.warn(&format!("[Startup] Embedding load failed: {}", e));
            }
        }
    }

    fn publish(
        &self,
        config_loaded: bool,
        servers_connected: bool,
        tools_loaded: bool,
        keywords_mapped: bool,
        error: Option<String>,
        details: StatusDetails,
    ) -> Arc<InitializationStatus> {
        let snapshot = Arc::new(InitializationStatus::new(
            config_loaded,
            servers_connected,
            tools_loaded,
            keywords_mapped,
            error,
            details,
        ));
        *self.status.write() = snapshot.clone();
        snapshot
    }

    /// Arm at most one background retry timer
    fn schedule_retry(self: &Arc<Self>, plan: RetryPlan) {
        let delay = match plan {
            RetryPlan::None => return,
            RetryPlan::Partial => PARTIAL_FAILURE_RETRY,
            RetryPlan::Index => INDEX_FAILURE_RETRY,
        };

        let orchestrator = Arc::clone(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Drop our own handle so the run below cannot abort itself.
            orchestrator.retry.lock().take();
            orchestrator.logger.info("[Startup] Retrying bring-up");
            orchestrator.initialize(false).await;
        });

        let mut retry = self.retry.lock();
        if let Some(previous) = retry.replace(timer) {
            previous.abort();
        }
    }
}

fn startup_delay() -> Option<Duration> {
    let raw = std::env::var(STARTUP_DELAY_ENV).ok()?;
    let millis: u64 = raw.trim().parse().ok()?;
    (millis > 0).then(|| Duration::from_millis(millis))
}
