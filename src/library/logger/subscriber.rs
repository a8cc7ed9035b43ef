use chrono::{FixedOffset, Utc};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Prints wall-clock time in a fixed timezone.
#[derive(Debug, Clone, Copy)]
struct TimezoneTimer {
    timezone: FixedOffset,
}

impl FormatTime for TimezoneTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let local_time = Utc::now().with_timezone(&self.timezone);
        write!(w, "{}", local_time.format("%Y-%m-%d %I:%M:%S%.3f %p"))
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init(timezone: FixedOffset) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(TimezoneTimer { timezone })
        .with_target(false)
        .try_init()
}
