//! Logging setup
//!
//! Installs a tracing subscriber whose level filter can be swapped at
//! runtime. Interactive prompts use [`LogHandle::quiet`] to keep log lines
//! from drawing over the selection UI.

use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, reload};

type FilterHandle = reload::Handle<LevelFilter, tracing_subscriber::Registry>;

/// Handle to the installed subscriber's level filter
#[derive(Clone)]
pub struct LogHandle {
    handle: FilterHandle,
}

impl LogHandle {
    /// Silences logging until the returned guard is dropped
    pub fn quiet(&self) -> QuietGuard {
        let previous = self.handle.clone_current();

        if let Err(e) = self.handle.modify(|filter| *filter = LevelFilter::OFF) {
            warn!("Failed to silence logging: {}", e);
        }

        QuietGuard {
            handle: self.handle.clone(),
            previous,
        }
    }

    /// Switches between `info` and `debug` output, e.g. once the config
    /// file has been read
    pub fn set_debug(&self, debug: bool) {
        if let Err(e) = self.handle.modify(|filter| *filter = level_for(debug)) {
            warn!("Failed to change the log level: {}", e);
        }
    }
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Restores the previous log level when dropped
pub struct QuietGuard {
    handle: FilterHandle,
    previous: Option<LevelFilter>,
}

impl Drop for QuietGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            // Nothing sensible to do if the subscriber is gone
            let _ = self.handle.modify(|filter| *filter = previous);
        }
    }
}

/// Installs the global subscriber
///
/// `RUST_LOG` narrows what is shown; the reloadable level caps it at `info`,
/// or `debug` when `debug` is set.
pub fn init_logging(debug: bool) -> LogHandle {
    let (level_layer, handle) = reload::Layer::new(level_for(debug));

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("playscout=trace,warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .without_time()
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry()
        .with(level_layer)
        .with(fmt_layer)
        .try_init();

    LogHandle { handle }
}
