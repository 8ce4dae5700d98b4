//! Tracing subscriber setup for the command-line front end
//!
//! The library only emits events; the binary decides where they go.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Output format for tracing events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Human-readable colored output
    #[default]
    Console,
    /// Plain output for CI logs
    Compact,
    /// One JSON object per event
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Subscriber configuration
#[derive(Debug, Default)]
pub struct TracingConfig {
    /// Verbosity level (0 = info, 1 = debug, 2+ = trace)
    pub verbosity: u8,
    pub format: TracingFormat,
    /// Explicit filter directive, overrides `verbosity`
    pub env_filter: Option<String>,
    /// Correlation id logged when the subscriber starts
    pub session_id: Option<String>,
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Filter directive for the configured verbosity
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Install the global subscriber
    ///
    /// `RUST_LOG` takes precedence over both `env_filter` and `verbosity`.
    ///
    /// # Errors
    /// - Invalid filter directive
    /// - A global subscriber is already installed
    pub fn init(self) -> anyhow::Result<()> {
        let filter = match (EnvFilter::try_from_default_env(), &self.env_filter) {
            (Ok(from_env), _) => from_env,
            (Err(_), Some(directive)) => EnvFilter::try_new(directive)?,
            (Err(_), None) => EnvFilter::try_new(self.verbosity_to_filter())?,
        };
        let registry = Registry::default().with(filter);

        match self.format {
            TracingFormat::Console => {
                let fmt_layer = fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            TracingFormat::Compact => {
                let fmt_layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr);
                registry.with(fmt_layer).try_init()?;
            },
        }

        if let Some(session_id) = &self.session_id {
            tracing::debug!(session_id = %session_id, "Tracing initialized");
        }

        Ok(())
    }
}

/// Install the CLI subscriber with a fresh session id
///
/// # Errors
/// - See [`TracingConfig::init`]
pub fn init_cli_tracing(verbosity: u8) -> anyhow::Result<()> {
    #[cfg(feature = "tracing-json")]
    let format = if std::env::var_os("IMGLY_BGEDIT_LOG_JSON").is_some() {
        TracingFormat::Json
    } else {
        TracingFormat::Console
    };
    #[cfg(not(feature = "tracing-json"))]
    let format = TracingFormat::Console;

    TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(format)
        .with_session_id(uuid::Uuid::new_v4().to_string())
        .init()
}

/// Span helpers for CLI operations
pub mod spans {
    use std::path::Path;
    use tracing::{Level, Span};

    /// Span covering one capture invocation
    pub fn capture(input: &Path, mask: &Path) -> Span {
        tracing::span!(
            Level::INFO,
            "capture",
            input = %input.display(),
            mask = %mask.display()
        )
    }

    /// Span covering one edit invocation
    pub fn edit(store_dir: Option<&Path>, script: Option<&Path>) -> Span {
        tracing::span!(
            Level::INFO,
            "edit",
            store_dir = %store_dir.map_or_else(|| "default".into(), |dir| dir.display().to_string()),
            script = %script.map_or_else(|| "none".into(), |path| path.display().to_string())
        )
    }
}
