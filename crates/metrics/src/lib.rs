use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters for one trade's strategy tree.
#[derive(Debug)]
pub struct StrategyMetrics {
    // Counters
    ticks_received: AtomicU64,
    ticks_skipped: AtomicU64,
    orders_placed: AtomicU64,
    orders_canceled: AtomicU64,
    market_fallbacks: AtomicU64,
    exchange_errors: AtomicU64,

    // Timestamps
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_order_time: Option<Instant>,
    last_error_time: Option<Instant>,
}

impl Default for StrategyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyMetrics {
    pub fn new() -> Self {
        Self {
            ticks_received: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            orders_placed: AtomicU64::new(0),
            orders_canceled: AtomicU64::new(0),
            market_fallbacks: AtomicU64::new(0),
            exchange_errors: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_order_time: None,
                last_error_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_ticks_received(&self) {
        self.ticks_received.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick dropped as a duplicate of the previous price.
    pub fn inc_ticks_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_orders_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_order_time = Some(Instant::now());
    }

    pub fn inc_orders_canceled(&self) {
        self.orders_canceled.fetch_add(1, Ordering::Relaxed);
    }

    /// A stop order replaced by a market order after an immediate-trigger rejection.
    pub fn inc_market_fallbacks(&self) {
        self.market_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_exchange_errors(&self) {
        self.exchange_errors.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    // --- Getter methods ---

    pub fn ticks_received(&self) -> u64 {
        self.ticks_received.load(Ordering::Relaxed)
    }

    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped.load(Ordering::Relaxed)
    }

    pub fn orders_placed(&self) -> u64 {
        self.orders_placed.load(Ordering::Relaxed)
    }

    pub fn orders_canceled(&self) -> u64 {
        self.orders_canceled.load(Ordering::Relaxed)
    }

    pub fn market_fallbacks(&self) -> u64 {
        self.market_fallbacks.load(Ordering::Relaxed)
    }

    pub fn exchange_errors(&self) -> u64 {
        self.exchange_errors.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_order(&self) -> Option<f64> {
        self.inner
            .read()
            .last_order_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        self.inner
            .read()
            .last_error_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks_received: self.ticks_received(),
            ticks_skipped: self.ticks_skipped(),
            orders_placed: self.orders_placed(),
            orders_canceled: self.orders_canceled(),
            market_fallbacks: self.market_fallbacks(),
            exchange_errors: self.exchange_errors(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_order: self.secs_since_last_order(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub ticks_received: u64,
    pub ticks_skipped: u64,
    pub orders_placed: u64,
    pub orders_canceled: u64,
    pub market_fallbacks: u64,
    pub exchange_errors: u64,
    pub uptime_secs: f64,
    pub secs_since_last_order: Option<f64>,
    pub secs_since_last_error: Option<f64>,
}

impl MetricsSnapshot {
    /// Orders canceled per order placed. Zero before the first placement.
    pub fn cancel_ratio(&self) -> f64 {
        if self.orders_placed == 0 {
            0.0
        } else {
            self.orders_canceled as f64 / self.orders_placed as f64
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Strategy Metrics ===")?;
        writeln!(f, "Uptime:            {:.1}s", self.uptime_secs)?;
        writeln!(f, "Ticks received:    {}", self.ticks_received)?;
        writeln!(f, "Ticks skipped:     {}", self.ticks_skipped)?;
        writeln!(f, "Orders placed:     {}", self.orders_placed)?;
        writeln!(f, "Orders canceled:   {}", self.orders_canceled)?;
        writeln!(f, "Market fallbacks:  {}", self.market_fallbacks)?;
        writeln!(f, "Exchange errors:   {}", self.exchange_errors)?;
        if let Some(secs) = self.secs_since_last_order {
            writeln!(f, "Since last order:  {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            write!(f, "Since last error:  {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared metrics handle.
pub type SharedMetrics = Arc<StrategyMetrics>;

/// Create a new shared metrics instance.
pub fn create_metrics() -> SharedMetrics {
    Arc::new(StrategyMetrics::new())
}
