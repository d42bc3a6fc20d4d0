//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for the engine's queue, batching, and persistence.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Queue admission bound; at capacity the lowest-priority items are
    /// evicted first to make room.
    pub max_queue_size: usize,
    /// Concurrency cap per batch: how many items dispatch in parallel.
    pub max_concurrent_syncs: usize,
    /// Bound on retained history records (FIFO eviction past it).
    pub history_limit: usize,
    /// Whether enqueue triggers a sync run when the engine is idle.
    /// Disable for hosts that drive `start_sync` themselves.
    pub auto_start: bool,
    /// Store collection holding the queue snapshot.
    pub queue_collection: String,
    /// Store collection holding the history snapshot.
    pub history_collection: String,
    /// Retry backoff policy.
    pub retry: RetryPolicy,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            max_queue_size: 500,
            max_concurrent_syncs: 5,
            history_limit: 1000,
            auto_start: true,
            queue_collection: "sync_queue".into(),
            history_collection: "sync_history".into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the queue admission bound.
    #[must_use]
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Sets the per-batch concurrency cap.
    #[must_use]
    pub fn with_max_concurrent_syncs(mut self, cap: usize) -> Self {
        self.max_concurrent_syncs = cap.max(1);
        self
    }

    /// Sets the history retention bound.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sets whether enqueue triggers a sync run when idle.
    #[must_use]
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Sets the retry backoff policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential backoff policy for retried items.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied per additional retry.
    pub backoff_multiplier: f64,
    /// Ceiling on the computed delay.
    pub max_delay: Duration,
    /// Whether to randomize delays to avoid synchronized retry storms.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Creates the default policy: 1 s base, doubling, 5 min ceiling,
    /// jitter on.
    pub fn new() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(300_000),
            jitter: true,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the delay ceiling.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay before retry number `retry_count` (1-based).
    ///
    /// `delay = min(base * multiplier^(retry_count - 1), max)`, then scaled
    /// by a uniform factor in `[0.5, 1.0]` when jitter is enabled - jitter
    /// only ever shortens the delay, so the ceiling always holds.
    pub fn delay_for_retry(&self, retry_count: u32) -> Duration {
        if retry_count == 0 {
            return Duration::ZERO;
        }

        let exponent = retry_count.saturating_sub(1).min(63) as i32;
        let raw = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = raw.min(self.max_delay.as_secs_f64());

        let scaled = if self.jitter {
            use rand::Rng;
            capped * rand::thread_rng().gen_range(0.5..=1.0)
        } else {
            capped
        };

        Duration::from_secs_f64(scaled)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
