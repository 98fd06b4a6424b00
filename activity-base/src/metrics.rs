use prometheus::{opts, register_int_counter_vec_with_registry, Encoder, IntCounterVec, Registry};

const NAMESPACE: &str = "activity_history";

macro_rules! namespaced {
    ($name:expr) => {
        format!("{NAMESPACE}_{}", $name)
    };
}

/// Counters describing how `fetch` calls were answered, labelled by chain.
#[derive(Clone, Debug)]
pub struct HistoryMetrics {
    registry: Registry,
    /// Requests answered entirely from cached intervals
    pub cache_hits: IntCounterVec,
    /// Requests that had to go to the remote source
    pub cache_misses: IntCounterVec,
    /// Source failures answered from possibly stale cache
    pub stale_fallbacks: IntCounterVec,
    /// Failed writes to the interval store
    pub store_failures: IntCounterVec,
}

impl HistoryMetrics {
    /// Register the history counters with `registry`
    pub fn new(registry: Registry) -> prometheus::Result<Self> {
        let cache_hits = register_int_counter_vec_with_registry!(
            opts!(
                namespaced!("cache_hits_total"),
                "Number of history pages served from cached intervals"
            ),
            &["chain"],
            registry
        )?;
        let cache_misses = register_int_counter_vec_with_registry!(
            opts!(
                namespaced!("cache_misses_total"),
                "Number of history pages fetched from the remote source"
            ),
            &["chain"],
            registry
        )?;
        let stale_fallbacks = register_int_counter_vec_with_registry!(
            opts!(
                namespaced!("stale_fallbacks_total"),
                "Number of source failures answered from cache without contiguity checks"
            ),
            &["chain"],
            registry
        )?;
        let store_failures = register_int_counter_vec_with_registry!(
            opts!(
                namespaced!("store_failures_total"),
                "Number of failed interval store writes"
            ),
            &["chain"],
            registry
        )?;

        Ok(Self {
            registry,
            cache_hits,
            cache_misses,
            stale_fallbacks,
            store_failures,
        })
    }

    /// Gather available metrics into an encoded (plaintext, OpenMetrics format) report.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 64);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }
}
