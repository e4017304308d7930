//! Central repository for hard-coded limits, timeouts and metric names

use std::time::Duration;

/// Webhook channel constants
pub mod webhook {
    use super::Duration;

    /// Timeout for a single webhook POST
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Alerts waiting for delivery before new ones are dropped
    pub const QUEUE_CAPACITY: usize = 1000;
}

/// Chain API client constants
pub mod api {
    use super::Duration;

    /// Slightly above the API server's own timeout so its errors reach us
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// How long a validator monitor tolerates an unreachable API server
    /// before escalating to a critical alert
    pub const DOWN_CRITICAL_AFTER_SECONDS: i64 = 15;

    /// Gauge holding the node's peer count
    pub const PEERS_GAUGE: &str = "tendermint_p2p_peers";
}

/// GitHub releases API constants
pub mod github {
    use super::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// GitHub rejects requests without a user agent
    pub const USER_AGENT: &str = concat!("alerter/", env!("CARGO_PKG_VERSION"));

    /// Releases read per request, the maximum GitHub serves in one page
    pub const RELEASES_PER_PAGE: &str = "100";
}

/// Prometheus scraper constants
pub mod metrics {
    use super::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Missed block alerting
pub mod missed_blocks {
    /// Consecutive misses that raise a warning
    pub const WARNING_AT: u64 = 5;

    /// Lowest consecutive miss count that can raise a critical alert
    pub const CRITICAL_MIN: u64 = 10;

    /// Critical alerts repeat every this many misses
    pub const CRITICAL_EVERY: u64 = 10;
}

/// Node monitor constants
pub mod node_monitor {
    /// Blocks behind the head after which the monitor counts as catching up
    pub const CATCHING_UP_THRESHOLD: u64 = 2;
}

/// Prometheus metrics scraped from a node's host
pub mod system_metrics {
    pub const PROCESS_CPU_SECONDS_TOTAL: &str = "process_cpu_seconds_total";
    pub const GO_MEMSTATS_ALLOC_BYTES: &str = "go_memstats_alloc_bytes";
    pub const GO_MEMSTATS_ALLOC_BYTES_TOTAL: &str = "go_memstats_alloc_bytes_total";
    pub const PROCESS_VIRTUAL_MEMORY_BYTES: &str = "process_virtual_memory_bytes";
    pub const PROCESS_MAX_FDS: &str = "process_max_fds";
    pub const PROCESS_OPEN_FDS: &str = "process_open_fds";
    pub const NODE_CPU_SECONDS_TOTAL: &str = "node_cpu_seconds_total";
    pub const NODE_FILESYSTEM_AVAIL_BYTES: &str = "node_filesystem_avail_bytes";
    pub const NODE_FILESYSTEM_SIZE_BYTES: &str = "node_filesystem_size_bytes";
    pub const NODE_MEMORY_MEMTOTAL_BYTES: &str = "node_memory_MemTotal_bytes";
    pub const NODE_MEMORY_MEMAVAILABLE_BYTES: &str = "node_memory_MemAvailable_bytes";

    pub const ALL: [&str; 11] = [
        PROCESS_CPU_SECONDS_TOTAL,
        GO_MEMSTATS_ALLOC_BYTES,
        GO_MEMSTATS_ALLOC_BYTES_TOTAL,
        PROCESS_VIRTUAL_MEMORY_BYTES,
        PROCESS_MAX_FDS,
        PROCESS_OPEN_FDS,
        NODE_CPU_SECONDS_TOTAL,
        NODE_FILESYSTEM_AVAIL_BYTES,
        NODE_FILESYSTEM_SIZE_BYTES,
        NODE_MEMORY_MEMTOTAL_BYTES,
        NODE_MEMORY_MEMAVAILABLE_BYTES,
    ];
}

/// Periodic alive reminder
pub mod alive_reminder {
    /// Longest mute accepted through the HTTP API, one year
    pub const MAX_MUTE_SECONDS: u64 = 365 * 24 * 60 * 60;
}

/// Worker supervision
pub mod supervisor {
    use super::Duration;

    /// Pause before a failed worker loop is restarted
    pub const RESTART_DELAY: Duration = Duration::from_secs(10);
}
