//! # logos-k: Gesture Engine over an Attributed Context Graph
//!
//! Executes small nested-expression programs whose every form is one of
//! six gestures, against a single attributed directed graph (the
//! *context*), and keeps running metrics over it: a coherence score, the
//! open tensions, and a registry of acknowledged unknowns (blind spots).
//!
//! ## Design Principles
//!
//! 1. **Gestures are the only mutators**: six functions over `&mut Context`, validated before any write
//! 2. **Clean DTOs**: `Entity`, `Relation`, `Event`, `Value` cross all boundaries
//! 3. **Parser owns nothing**: program text → `Operation` trees is a pure function
//! 4. **Metrics are derived**: coherence is recomputed from graph shape, never stored as state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use logos_k::{Engine, RuntimeConfig};
//!
//! # async fn example() -> logos_k::Result<()> {
//! let engine = Engine::silent(RuntimeConfig::default())?;
//!
//! let report = engine.run(r#"
//!     (Α "dawn" (intent first light))
//!     (Λ "dawn" "dusk")
//!     (Ω)
//! "#).await?;
//!
//! println!("coherence {:.2}", report.summary.coherence);
//! # Ok(())
//! # }
//! ```
//!
//! ## Gestures
//!
//! | Symbol | Name | Effect |
//! |--------|------|--------|
//! | `Α` | collapse | create an entity |
//! | `Λ` | link | create a relation, auto-creating endpoints |
//! | `Σ` | synthesize | create an entity from two or more parts |
//! | `Ω` | extract | snapshot an invariant from current state |
//! | `∇` | enrich | integrate an invariant into a target |
//! | `Φ` | dialogue | consult an [`Oracle`] and gate its answer |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod syntax;
pub mod config;
pub mod axiom;
pub mod context;
pub mod nigc;
pub mod oracle;
pub mod gesture;
pub mod execution;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Entity, EntityKind, Relation, RelId, RelationType, Event, GestureKind,
    ResultRef, Tension, TensionKind, Value, PropertyMap, LimitType,
};

// ============================================================================
// Re-exports: Runtime
// ============================================================================

pub use axiom::{AxiomGuard, LimitKind};
pub use config::{BlindSpotSeed, EntityPolicy, FairCareMetadata, RuntimeConfig};
pub use context::{Context, Summary};
pub use execution::{Dispatcher, OperationResult, RunReport};
pub use execution::recovery::{RecoveryAction, RecoveryPolicy};
pub use export::{CycleRecord, CycleSummary};
pub use oracle::{Oracle, ReflectiveOracle, ScriptedOracle, SilentOracle};

use syntax::ast::Operation;

// ============================================================================
// Top-level Engine handle
// ============================================================================

/// The primary entry point. An `Engine` owns one context behind a single
/// lock and runs programs against it one at a time.
pub struct Engine<O: Oracle = SilentOracle> {
    dispatcher: Dispatcher,
    oracle: O,
    context: tokio::sync::Mutex<Context>,
}

impl<O: Oracle> Engine<O> {
    /// Validate `config` and start from a fresh context.
    pub fn new(config: RuntimeConfig, oracle: O) -> Result<Self> {
        let dispatcher = Dispatcher::new(config)?;
        let context = tokio::sync::Mutex::new(dispatcher.new_context());
        Ok(Self { dispatcher, oracle, context })
    }

    /// Parse and run program text. Only syntax errors fail the call.
    pub async fn run(&self, source: &str) -> Result<RunReport> {
        let program = syntax::parse(source)?;
        Ok(self.run_program(&program).await)
    }

    /// Run already-parsed operation trees. The context lock is held for
    /// the whole program.
    pub async fn run_program(&self, program: &[Operation]) -> RunReport {
        let mut ctx = self.context.lock().await;
        self.dispatcher.run(&mut ctx, program, &self.oracle).await
    }

    pub async fn summary(&self) -> Summary {
        self.context.lock().await.summary()
    }

    /// Clone of the current context.
    pub async fn snapshot(&self) -> Context {
        self.context.lock().await.clone()
    }

    /// Validate the context against `cycle` and build its export record.
    pub async fn export(&self, cycle: &CycleSummary) -> Result<CycleRecord> {
        let ctx = self.context.lock().await;
        CycleRecord::build(cycle, &ctx, self.dispatcher.config())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_context(self) -> Context {
        self.context.into_inner()
    }
}

impl Engine<SilentOracle> {
    /// Engine whose dialogues always meet silence.
    pub fn silent(config: RuntimeConfig) -> Result<Self> {
        Self::new(config, SilentOracle)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid operand for {gesture}: {message}")]
    InvalidOperand { gesture: GestureKind, message: String },

    #[error("Synthesis '{name}' would reference itself")]
    SelfReference { name: String },

    #[error("Limit exceeded: {limit} {value} > {ceiling}")]
    LimitExceeded { limit: LimitKind, value: usize, ceiling: usize },

    #[error("Prohibited phrasing: '{term}'")]
    ProhibitedPhrasing { term: String },

    #[error("Validation failed ({check}): {message}")]
    ValidationFailure { check: String, message: String },

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Fieldless mirror of [`Error`], used by the recovery policy and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidOperand,
    SelfReference,
    LimitExceeded,
    ProhibitedPhrasing,
    ValidationFailure,
    UnknownOperator,
    SyntaxError,
    Config,
    NotFound,
    Oracle,
    Io,
    Serialization,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::InvalidOperand,
        ErrorKind::SelfReference,
        ErrorKind::LimitExceeded,
        ErrorKind::ProhibitedPhrasing,
        ErrorKind::ValidationFailure,
        ErrorKind::UnknownOperator,
        ErrorKind::SyntaxError,
        ErrorKind::Config,
        ErrorKind::NotFound,
        ErrorKind::Oracle,
        ErrorKind::Io,
        ErrorKind::Serialization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidOperand => "invalid_operand",
            ErrorKind::SelfReference => "self_reference",
            ErrorKind::LimitExceeded => "limit_exceeded",
            ErrorKind::ProhibitedPhrasing => "prohibited_phrasing",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::UnknownOperator => "unknown_operator",
            ErrorKind::SyntaxError => "syntax_error",
            ErrorKind::Config => "config",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Oracle => "oracle",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidOperand { .. } => ErrorKind::InvalidOperand,
            Error::SelfReference { .. } => ErrorKind::SelfReference,
            Error::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Error::ProhibitedPhrasing { .. } => ErrorKind::ProhibitedPhrasing,
            Error::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            Error::UnknownOperator(_) => ErrorKind::UnknownOperator,
            Error::SyntaxError { .. } => ErrorKind::SyntaxError,
            Error::Config(_) => ErrorKind::Config,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Oracle(_) => ErrorKind::Oracle,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) | Error::Toml(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
