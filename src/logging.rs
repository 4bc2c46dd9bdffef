use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter, e.g. `PAIRFLIP_LOG=debug`
pub const LOG_ENV: &str = "PAIRFLIP_LOG";
const DEFAULT_FILTER: &str = "info";

fn filter_from(value: Option<&str>) -> EnvFilter {
    value
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Route tracing output to `path`. The terminal belongs to the UI, so
/// nothing is ever written to stdout or stderr. A subscriber installed
/// earlier (tests, embedding hosts) is left in place.
pub fn init(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());

    let _ = fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_filter_falls_back_to_default() {
        assert_eq!(filter_from(None).to_string(), DEFAULT_FILTER);
        assert_eq!(filter_from(Some("pairflip=loudest")).to_string(), DEFAULT_FILTER);
        assert_eq!(filter_from(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("pairflip.log");
        init(&path).unwrap();
        assert!(path.exists());

        // A second install is a quiet no-op
        init(&path).unwrap();
    }
}
