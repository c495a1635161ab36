use crate::caps::map_tags;
use crate::engine::mp4::Mp4EngineFactory;
use crate::engine::{DiscoveryResult, DiscoveryStatus, Engine, EngineFactory};
use crate::error::{ArgumentError, ProbeError};
use crate::topology::{StreamNode, build_node};
use crate::value::ValueMap;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

pub type ProbeOutcome = Result<ProbeResult, ProbeError>;

const NANOS_PER_US: u64 = 1_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Duration split into hours, minutes, seconds and microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DurationHms {
    pub h: u64,
    pub m: u32,
    pub s: u32,
    #[serde(rename = "us")]
    pub microseconds: u32,
}

impl DurationHms {
    /// Exact base-60 / base-1,000,000 split, truncating sub-microsecond
    /// remainders.
    pub fn from_nanos(ns: u64) -> Self {
        let secs = ns / NANOS_PER_SEC;
        DurationHms {
            h: secs / 3600,
            m: ((secs / 60) % 60) as u32,
            s: (secs % 60) as u32,
            microseconds: ((ns % NANOS_PER_SEC) / NANOS_PER_US) as u32,
        }
    }
}

impl fmt::Display for DurationHms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}.{:06}", self.h, self.m, self.s, self.microseconds)
    }
}

/// Everything a successful probe found out about one resource.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub duration: DurationHms,
    pub seekable: bool,
    pub live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<ValueMap>,
    pub topology: StreamNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// One probe of one resource.
///
/// The engine, its result and every stream handle are owned by the session
/// for the duration of [`ProbeSession::run`] and dropped before it returns,
/// whichever way it returns.
pub struct ProbeSession<F: EngineFactory> {
    factory: Arc<F>,
    uri: String,
    timeout: Duration,
    state: SessionState,
    outcome: Option<ProbeOutcome>,
}

impl<F: EngineFactory> ProbeSession<F> {
    pub fn new(factory: Arc<F>, uri: impl Into<String>, timeout_secs: u32) -> Self {
        ProbeSession {
            factory,
            uri: uri.into(),
            timeout: Duration::from_secs(u64::from(timeout_secs)),
            state: SessionState::Idle,
            outcome: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the engine and build the result. Blocks the calling thread.
    ///
    /// A session runs once; later calls return the same outcome.
    pub fn run(&mut self) -> ProbeOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        self.state = SessionState::Running;
        tracing::debug!(uri = %self.uri, timeout = ?self.timeout, "probe running");

        let outcome = self.execute();
        self.state = match &outcome {
            Ok(_) => SessionState::Succeeded,
            Err(_) => SessionState::Failed,
        };

        match &outcome {
            Ok(result) => tracing::info!(uri = %self.uri, duration = %result.duration, "probe succeeded"),
            Err(e) => tracing::info!(uri = %self.uri, error = %e, "probe failed"),
        }
        self.outcome = Some(outcome.clone());
        outcome
    }

    // Locals drop in reverse order: stream handles, then result, then engine.
    fn execute(&self) -> ProbeOutcome {
        let mut engine = self.factory.create(self.timeout).map_err(|e| {
            tracing::warn!(error = %e, "engine construction failed");
            ProbeError::EngineInitFailed
        })?;

        let info = engine.discover(&self.uri).map_err(|e| {
            tracing::warn!(uri = %self.uri, error = %e, "engine reported an error");
            ProbeError::Engine(e.message)
        })?;

        let status = info.status();
        if status != DiscoveryStatus::Ok {
            return Err(ProbeError::ResultNotOk(status));
        }

        let root = info.stream_info().ok_or(ProbeError::NoStreamInfo)?;
        let topology = build_node(&root);

        Ok(ProbeResult {
            duration: DurationHms::from_nanos(info.duration_ns().unwrap_or(0)),
            seekable: info.is_seekable(),
            live: info.is_live(),
            tags: map_tags(info.tags().as_ref()),
            topology,
        })
    }
}

/// The single notification a probe delivers: exactly one side is set.
#[derive(Debug, Clone)]
pub struct Completion {
    pub error: Option<String>,
    pub result: Option<ProbeResult>,
}

impl From<ProbeOutcome> for Completion {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            Ok(result) => Completion {
                error: None,
                result: Some(result),
            },
            Err(e) => Completion {
                error: Some(e.to_string()),
                result: None,
            },
        }
    }
}

/// A probe running on the blocking pool.
pub struct ProbeTask {
    handle: JoinHandle<ProbeOutcome>,
}

impl ProbeTask {
    pub async fn outcome(self) -> ProbeOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ProbeError::Engine(format!("probe task failed: {}", e))),
        }
    }

    pub async fn completion(self) -> Completion {
        Completion::from(self.outcome().await)
    }
}

/// Entry point for probes backed by one engine factory.
///
/// Building a `Prober` performs the process-wide setup; keep one per
/// process and share it.
pub struct Prober<F: EngineFactory> {
    factory: Arc<F>,
}

impl<F: EngineFactory> Prober<F> {
    pub fn new(factory: F) -> Self {
        init();
        factory.initialize();
        Prober {
            factory: Arc::new(factory),
        }
    }

    pub fn session(&self, uri: impl Into<String>, timeout_secs: u32) -> ProbeSession<F> {
        ProbeSession::new(Arc::clone(&self.factory), uri, timeout_secs)
    }

    /// Probe on the current thread.
    pub fn probe_blocking(&self, uri: &str, timeout_secs: u32) -> Result<ProbeOutcome, ArgumentError> {
        validate(uri, timeout_secs)?;
        Ok(self.session(uri, timeout_secs).run())
    }

    /// Probe on tokio's blocking pool. Arguments are checked before anything
    /// is scheduled. Must be called from within a tokio runtime.
    pub fn spawn(&self, uri: &str, timeout_secs: u32) -> Result<ProbeTask, ArgumentError> {
        validate(uri, timeout_secs)?;
        let mut session = self.session(uri, timeout_secs);
        let handle = tokio::task::spawn_blocking(move || session.run());
        Ok(ProbeTask { handle })
    }

    /// Callback form of [`Prober::spawn`]: `callback` runs exactly once with
    /// `(error, result)`.
    pub fn probe_with_callback<C>(
        &self,
        uri: &str,
        timeout_secs: u32,
        callback: C,
    ) -> Result<JoinHandle<()>, ArgumentError>
    where
        C: FnOnce(Option<String>, Option<ProbeResult>) + Send + 'static,
    {
        let task = self.spawn(uri, timeout_secs)?;
        Ok(tokio::spawn(async move {
            let Completion { error, result } = task.completion().await;
            callback(error, result);
        }))
    }
}

fn validate(uri: &str, timeout_secs: u32) -> Result<(), ArgumentError> {
    if uri.trim().is_empty() {
        return Err(ArgumentError::EmptyUri);
    }
    if timeout_secs == 0 {
        return Err(ArgumentError::ZeroTimeout);
    }
    Ok(())
}

static INIT: OnceLock<()> = OnceLock::new();

/// Process-wide one-time setup. Later calls do nothing.
pub fn init() {
    INIT.get_or_init(|| {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "media probe initialized");
    });
}

/// Probe `uri` with the built-in MP4 engine.
pub fn probe(uri: &str, timeout_secs: u32) -> Result<ProbeTask, ArgumentError> {
    static PROBER: OnceLock<Prober<Mp4EngineFactory>> = OnceLock::new();
    PROBER
        .get_or_init(|| Prober::new(Mp4EngineFactory))
        .spawn(uri, timeout_secs)
}
