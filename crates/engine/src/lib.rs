//! Recursive comparison engine for schema-described records.
//!
//! One call to [`StructuredEvaluator::compare`] walks a ground-truth /
//! prediction record pair once and produces, from that single traversal:
//!
//! - a **weighted similarity score** per node (the weighted mean of
//!   child threshold-applied scores),
//! - a **hierarchical confusion matrix** — `{tp, tn, fd, fa, fp, fn}`
//!   counts at every level (`overall` counts objects at that level,
//!   `aggregate` sums the primitives of the subtree), with optional
//!   derived precision/recall/F1/accuracy,
//! - a flat list of **non-match records** with dotted field paths.
//!
//! # Routing
//!
//! The dispatcher routes each field pair by declared type and null state:
//! primitives hit their configured comparator; nested records recurse and
//! classify the subtree score as one object; primitive lists are matched
//! order-free by optimal assignment; record lists are matched by
//! assignment over full recursive similarities with **threshold-gated
//! recursion** — only pairs clearing the element schema's
//! `match_threshold` contribute field-level children, the rest stay atomic
//! false discoveries.
//!
//! # Classification
//!
//! `TP`: both present, score at or above threshold. `FD`: both present,
//! below threshold. `FA`: ground truth null, prediction present. `FN`:
//! ground truth present, prediction null. `TN`: both null. `FP = FD + FA`
//! at every node. Null means null-equivalent: null, `""`, `[]` or `{}`.
//!
//! # Error posture
//!
//! Only precondition violations fail a comparison: invalid schema,
//! unresolvable comparator name, non-record inputs, cancellation. Missing
//! values, type-wrong values and below-threshold pairs are classification
//! outcomes inside the result tree, never errors; a comparator error
//! degrades to a 0.0 score.

mod cancel;
mod dispatch;
mod error;
mod evaluator;
mod field;
mod metrics;
mod node;
mod non_match;
mod options;
mod primitive_list;
mod record_list;
mod report;
mod traverse;

pub use crate::cancel::CancelToken;
pub use crate::error::EngineError;
pub use crate::evaluator::StructuredEvaluator;
pub use crate::node::{Aggregate, ComparisonNode, Counts, Derived, Overall};
pub use crate::non_match::{NonMatch, NonMatchKind};
pub use crate::options::CompareOptions;
pub use crate::report::{ComparisonReport, EvaluatorOverall, EvaluatorSummary};
