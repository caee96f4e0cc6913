use tracing::{Dispatch, Level};

/// Logging sink handed explicitly to the prober, scanner, browser and
/// orchestrator.
///
/// The core never installs a global subscriber. An `Observer` either carries its
/// own [`Dispatch`], which becomes the default for the duration of each
/// operation (including on the discovery thread), or inherits whatever the
/// calling thread already has.
#[derive(Clone, Default)]
pub struct Observer {
    dispatch: Option<Dispatch>,
}

impl Observer {
    /// Logs through the subscriber active on the calling thread, if any.
    pub fn inherit() -> Self {
        Self { dispatch: None }
    }

    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Human readable logs on stderr, filtered at `level`.
    pub fn stderr(level: Level) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        Self::new(Dispatch::new(subscriber))
    }

    /// Runs `f` with this observer's dispatch as the thread default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("injected", &self.dispatch.is_some())
            .finish()
    }
}
