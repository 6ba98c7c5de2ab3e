// =============================================================================
// Application State — shared across request handlers via `Arc<AppState>`
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::decision_envelope::AnalysisEnvelope;
use crate::market_data::MarketDataProvider;
use crate::resolver::MarketContextResolver;
use crate::runtime_config::RuntimeConfig;

/// Maximum number of recent analyses to retain.
const MAX_RECENT_DECISIONS: usize = 100;

pub struct AppState {
    /// Incremented on every recorded analysis or config change.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    /// Where flag updates are persisted.
    pub config_path: PathBuf,

    // ── Market Data ─────────────────────────────────────────────────────
    pub resolver: MarketContextResolver,

    // ── Audit Trail ─────────────────────────────────────────────────────
    pub recent_decisions: RwLock<Vec<AnalysisEnvelope>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    /// The resolver takes its settings from `config` once; later changes to
    /// resolver settings need a restart.
    pub fn new(
        config: RuntimeConfig,
        config_path: impl Into<PathBuf>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        let resolver = MarketContextResolver::new(provider, config.resolver.clone());
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            config_path: config_path.into(),
            resolver,
            recent_decisions: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn increment_version(&self) {
        self.state_version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Record an analysis envelope. The ring buffer is capped at
    /// [`MAX_RECENT_DECISIONS`]; oldest entries are evicted first.
    pub fn push_decision(&self, envelope: AnalysisEnvelope) {
        let mut decisions = self.recent_decisions.write();
        decisions.push(envelope);
        while decisions.len() > MAX_RECENT_DECISIONS {
            decisions.remove(0);
        }
        drop(decisions);

        self.increment_version();
    }
}
