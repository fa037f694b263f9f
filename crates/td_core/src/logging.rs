use std::str::FromStr;
use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Parse a `LOG_LEVEL` value, falling back to INFO for anything unknown.
pub fn parse_level(level: &str) -> (Level, bool) {
    match Level::from_str(level.trim()) {
        Ok(level) => (level, true),
        Err(_) => (Level::INFO, false),
    }
}

pub fn init_logging(level: &str) {
    let (max_level, recognized) = parse_level(level);
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(max_level)
                .with_target(false)
                .init();
        });
    }
    if !recognized {
        tracing::warn!(level, "Unknown LOG_LEVEL, using INFO");
    }
}
