//! Workspace umbrella crate for Stickler structured-output evaluation.
//!
//! The `stickler` crate re-exports the schema, comparator, assignment, and
//! engine layers so applications can drive a full evaluation through a
//! single dependency. Helpers such as [`evaluate`] and
//! [`evaluate_with_registry`] orchestrate the stages end-to-end (load the
//! schema, bind the documents, run the comparison), while
//! [`evaluate_records`] is the entry point for callers that already hold
//! bound values and a registry.
//!
//! ## Quick start
//!
//! ```rust
//! use stickler::{evaluate, CompareOptions};
//!
//! let schema = serde_json::json!({
//!     "type": "object",
//!     "title": "Contact",
//!     "properties": {
//!         "name": {"type": "string", "x-weight": 2.0},
//!         "phone": {"type": "string"},
//!     },
//! });
//! let gt = serde_json::json!({"name": "John", "phone": "555-1"});
//! let pred = serde_json::json!({"name": "John"});
//!
//! let report = evaluate(&gt, &pred, &schema, &CompareOptions::detailed()).unwrap();
//! assert!(!report.all_fields_matched);
//! let non_matches = report.non_matches.as_ref().unwrap();
//! assert_eq!(non_matches[0].field_path, "phone");
//! ```
//!
//! ## Observability
//!
//! Metrics and structured logs can be captured by installing an
//! [`EvaluationMetrics`] recorder via [`set_evaluation_metrics`] and/or an
//! [`EvaluationEventLogger`] with [`set_evaluation_logger`]. Both hooks
//! receive the schema name, its field count, and the concrete stage
//! outcome so deployments can correlate evaluation volume and latency with
//! upstream systems. `EvaluationMetrics` is best suited for emitting
//! latency/histogram telemetry, whereas `EvaluationEventLogger` provides
//! structured events for centralized logging. In typical services these
//! hooks are registered once during startup.
//!
//! ## Errors
//!
//! Failures produced by any layer converge on [`EvalError`], which maps
//! the source error and preserves context for downstream handling. Callers
//! can distinguish schema, document-binding, and engine failures without
//! depending on the individual workspace crates. Data-level disagreements
//! never error — they are classification outcomes in the report.

pub use assignment::{solve_assignment, Assignment};
pub use comparators::{
    levenshtein_similarity, Comparator, ComparatorError, ComparatorRegistry, ExactComparator,
    LevenshteinComparator, NumericComparator,
};
pub use engine::{
    Aggregate, CancelToken, CompareOptions, ComparisonNode, ComparisonReport, Counts, Derived,
    EngineError, EvaluatorOverall, EvaluatorSummary, NonMatch, NonMatchKind, Overall,
    StructuredEvaluator,
};
pub use schema::{
    record_schema_from_json, DeclaredType, FieldConfig, FieldSchema, PrimitiveType, RecordSchema,
    SchemaError, Value,
};

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};

/// Errors that can occur while driving an evaluation end-to-end.
#[derive(Debug, Clone)]
pub enum EvalError {
    Schema(SchemaError),
    Engine(EngineError),
    InvalidDocument(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Schema(err) => write!(f, "schema failure: {err}"),
            EvalError::Engine(err) => write!(f, "comparison failure: {err}"),
            EvalError::InvalidDocument(msg) => write!(f, "invalid document: {msg}"),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvalError::Schema(err) => Some(err),
            EvalError::Engine(err) => Some(err),
            EvalError::InvalidDocument(_) => None,
        }
    }
}

impl From<SchemaError> for EvalError {
    fn from(value: SchemaError) -> Self {
        EvalError::Schema(value)
    }
}

impl From<EngineError> for EvalError {
    fn from(value: EngineError) -> Self {
        EvalError::Engine(value)
    }
}

/// Metrics observer for evaluation stages.
pub trait EvaluationMetrics: Send + Sync {
    fn record_schema_load(&self, latency: Duration, result: Result<(), EvalError>);
    fn record_compare(&self, latency: Duration, result: Result<(), EvalError>);
}

/// Processing stage captured in observability events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalStage {
    SchemaLoad,
    Compare,
}

impl fmt::Display for EvalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalStage::SchemaLoad => "schema_load",
            EvalStage::Compare => "compare",
        };
        f.write_str(name)
    }
}

/// Outcome of an evaluation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalEventStatus {
    Success,
    Failure,
}

impl fmt::Display for EvalEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvalEventStatus::Success => "success",
            EvalEventStatus::Failure => "failure",
        };
        f.write_str(label)
    }
}

/// Structured observation describing the outcome of an evaluation stage.
#[derive(Debug, Clone)]
pub struct EvalEvent {
    pub stage: EvalStage,
    pub status: EvalEventStatus,
    pub latency: Duration,
    pub schema: String,
    pub field_count: usize,
    pub error: Option<String>,
}

impl EvalEvent {
    fn from_outcome(
        stage: EvalStage,
        context: &StageContext,
        latency: Duration,
        error: Option<String>,
    ) -> Self {
        let status = if error.is_some() {
            EvalEventStatus::Failure
        } else {
            EvalEventStatus::Success
        };
        Self {
            stage,
            status,
            latency,
            schema: context.schema.clone(),
            field_count: context.field_count,
            error,
        }
    }

    fn format_key_values(&self, include_timestamp: bool) -> String {
        let mut parts = Vec::new();
        if include_timestamp {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            parts.push(format!("timestamp=\"{ts}\""));
        }
        let stage = self.stage;
        parts.push(format!("stage={stage}"));
        let status = self.status;
        parts.push(format!("status={status}"));
        let latency_us = self.latency.as_micros();
        parts.push(format!("latency_us={latency_us}"));
        let schema = escape_kv(&self.schema);
        parts.push(format!("schema=\"{schema}\""));
        parts.push(format!("field_count={}", self.field_count));
        if let Some(error) = &self.error {
            let error = escape_kv(error);
            parts.push(format!("error=\"{error}\""));
        }
        parts.join(" ")
    }
}

fn escape_kv(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Hook for emitting structured events per evaluation stage.
pub trait EvaluationEventLogger: Send + Sync {
    fn log(&self, event: &EvalEvent);
}

/// Simple key-value logger that writes structured events to any writer.
pub struct KeyValueLogger {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    include_timestamp: bool,
}

impl KeyValueLogger {
    /// Create a logger that writes to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Create a logger backed by the provided writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            include_timestamp: true,
        }
    }

    /// Toggle timestamp emission for the structured log line.
    pub fn with_timestamps(mut self, include_timestamp: bool) -> Self {
        self.include_timestamp = include_timestamp;
        self
    }
}

impl EvaluationEventLogger for KeyValueLogger {
    fn log(&self, event: &EvalEvent) {
        if let Ok(mut writer) = self.writer.lock() {
            let line = event.format_key_values(self.include_timestamp);
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Install or clear the global evaluation metrics recorder.
pub fn set_evaluation_metrics(recorder: Option<Arc<dyn EvaluationMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("evaluation metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn EvaluationMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn EvaluationMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn EvaluationMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the structured evaluation event logger.
pub fn set_evaluation_logger(logger: Option<Arc<dyn EvaluationEventLogger>>) {
    let lock = logger_lock();
    let mut guard = lock.write().expect("evaluation logger lock poisoned");
    *guard = logger;
}

fn logger_lock() -> &'static RwLock<Option<Arc<dyn EvaluationEventLogger>>> {
    static LOGGER: OnceLock<RwLock<Option<Arc<dyn EvaluationEventLogger>>>> = OnceLock::new();
    LOGGER.get_or_init(|| RwLock::new(None))
}

fn evaluation_logger() -> Option<Arc<dyn EvaluationEventLogger>> {
    let guard = logger_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

#[derive(Debug, Clone)]
struct StageContext {
    schema: String,
    field_count: usize,
}

impl StageContext {
    fn from_schema_json(schema_json: &serde_json::Value) -> Self {
        let schema = schema_json
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Document")
            .to_string();
        Self {
            schema,
            field_count: 0,
        }
    }

    fn from_schema(schema: &RecordSchema) -> Self {
        Self {
            schema: schema.name.clone(),
            field_count: schema.fields.len(),
        }
    }
}

struct MetricsSpan {
    recorder: Option<Arc<dyn EvaluationMetrics>>,
    logger: Option<Arc<dyn EvaluationEventLogger>>,
    stage: EvalStage,
    context: StageContext,
    start: Instant,
}

impl MetricsSpan {
    fn start(stage: EvalStage, context: StageContext) -> Option<Self> {
        let recorder = metrics_recorder();
        let logger = evaluation_logger();
        if recorder.is_none() && logger.is_none() {
            return None;
        }
        Some(Self {
            recorder,
            logger,
            stage,
            context,
            start: Instant::now(),
        })
    }

    fn update_context<F>(&mut self, update: F)
    where
        F: FnOnce(&mut StageContext),
    {
        update(&mut self.context);
    }

    fn record(self, result: Result<(), EvalError>) {
        let latency = self.start.elapsed();
        if let Some(logger) = self.logger.as_ref() {
            let event = EvalEvent::from_outcome(
                self.stage,
                &self.context,
                latency,
                result.as_ref().err().map(|e| e.to_string()),
            );
            logger.log(&event);
        }
        if let Some(recorder) = self.recorder {
            match self.stage {
                EvalStage::SchemaLoad => recorder.record_schema_load(latency, result),
                EvalStage::Compare => recorder.record_compare(latency, result),
            }
        }
    }
}

/// Load and validate a record schema from a JSON Schema document.
pub fn load_schema(schema_json: &serde_json::Value) -> Result<Arc<RecordSchema>, EvalError> {
    let mut span = MetricsSpan::start(
        EvalStage::SchemaLoad,
        StageContext::from_schema_json(schema_json),
    );
    match record_schema_from_json(schema_json) {
        Ok(schema) => {
            if let Some(span) = span.as_mut() {
                span.update_context(|ctx| *ctx = StageContext::from_schema(&schema));
            }
            if let Some(span) = span.take() {
                span.record(Ok(()));
            }
            Ok(schema)
        }
        Err(err) => {
            let err = EvalError::Schema(err);
            if let Some(span) = span.take() {
                span.record(Err(err.clone()));
            }
            Err(err)
        }
    }
}

/// Evaluate a ground-truth/prediction document pair against a JSON Schema,
/// using the built-in comparator registry.
pub fn evaluate(
    gt: &serde_json::Value,
    pred: &serde_json::Value,
    schema_json: &serde_json::Value,
    opts: &CompareOptions,
) -> Result<ComparisonReport, EvalError> {
    let registry = ComparatorRegistry::with_defaults();
    evaluate_with_registry(gt, pred, schema_json, &registry, opts)
}

/// Evaluate a document pair against a JSON Schema with a caller-supplied
/// registry (needed when schemas reference custom comparator names).
pub fn evaluate_with_registry(
    gt: &serde_json::Value,
    pred: &serde_json::Value,
    schema_json: &serde_json::Value,
    registry: &ComparatorRegistry,
    opts: &CompareOptions,
) -> Result<ComparisonReport, EvalError> {
    let schema = load_schema(schema_json)?;
    let gt_record = schema
        .record_from_json(gt)
        .map_err(|err| EvalError::InvalidDocument(format!("ground truth: {err}")))?;
    let pred_record = schema
        .record_from_json(pred)
        .map_err(|err| EvalError::InvalidDocument(format!("prediction: {err}")))?;
    evaluate_records(&gt_record, &pred_record, &schema, registry, opts)
}

/// Evaluate pre-bound record values against a loaded schema.
pub fn evaluate_records(
    gt: &Value,
    pred: &Value,
    schema: &Arc<RecordSchema>,
    registry: &ComparatorRegistry,
    opts: &CompareOptions,
) -> Result<ComparisonReport, EvalError> {
    let span = MetricsSpan::start(EvalStage::Compare, StageContext::from_schema(schema));
    let outcome = StructuredEvaluator::new(schema.clone(), registry)
        .and_then(|evaluator| evaluator.compare(gt, pred, opts))
        .map_err(EvalError::Engine);
    if let Some(span) = span {
        span.record(outcome.as_ref().map(|_| ()).map_err(Clone::clone));
    }
    outcome
}
