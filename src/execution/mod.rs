//! # Dispatcher
//!
//! Walks operation trees in program order, resolves nested forms into
//! [`GestureCall`]s, routes each call to its gesture, and appends one
//! [`Event`] per executed gesture with the coherence sampled around it.
//!
//! Failures are scoped to the top-level operation they occur in. The
//! [`RecoveryPolicy`](recovery::RecoveryPolicy) decides whether a failure
//! is answered with a checkpoint Extract.

pub mod recovery;

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::axiom::AxiomGuard;
use crate::config::RuntimeConfig;
use crate::context::{Context, Summary};
use crate::export::CycleSummary;
use crate::gesture::{self, DialogueSettings, GestureCall};
use crate::model::*;
use crate::oracle::Oracle;
use crate::syntax::ast::{Atom, Operand, Operation};
use crate::{Error, ErrorKind, Result};

use recovery::RecoveryAction;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use crate::syntax::ast::INTENT_FORM;

// ============================================================================
// Run report
// ============================================================================

/// Outcome of one top-level operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    Completed {
        gesture: String,
        result: ResultRef,
    },
    Failed {
        gesture: String,
        failure: Failure,
        /// Result of the recovery gesture, when one ran and succeeded.
        recovery: Option<ResultRef>,
    },
}

impl OperationResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationResult::Completed { .. })
    }

    pub fn result(&self) -> Option<&ResultRef> {
        match self {
            OperationResult::Completed { result, .. } => Some(result),
            OperationResult::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            OperationResult::Failed { failure, .. } => Some(failure),
            OperationResult::Completed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(e: &Error) -> Self {
        Self { kind: e.kind(), message: e.to_string() }
    }
}

/// A non-binding hint raised by a gesture (Extract under high tension).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub seq: u64,
    pub gesture: GestureKind,
    pub message: String,
}

/// Execution statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub entities_created: u64,
    pub relations_created: u64,
    pub tensions_created: u64,
    pub tensions_resolved: u64,
    pub blind_spots_registered: u64,
    pub dialogues: u64,
    pub operations_failed: u64,
    pub recoveries: u64,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<OperationResult>,
    /// Events appended by this run (recoveries included).
    pub events: usize,
    pub advisories: Vec<Advisory>,
    pub stats: ExecutionStats,
    /// Metrics at the end of the run.
    pub summary: Summary,
    pub cycle: CycleSummary,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.results.iter().filter_map(OperationResult::failure)
    }

    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: RuntimeConfig,
    guard: AxiomGuard,
    dialogue: DialogueSettings,
}

impl Dispatcher {
    /// Validates the configuration once, up front.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            guard: AxiomGuard::from_config(&config),
            dialogue: DialogueSettings::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn guard(&self) -> &AxiomGuard {
        &self.guard
    }

    /// Fresh context seeded from this dispatcher's configuration.
    pub fn new_context(&self) -> Context {
        Context::new(&self.config)
    }

    /// Run a whole program. Never fails: per-operation failures are
    /// reported in [`RunReport::results`].
    pub async fn run<O: Oracle + ?Sized>(
        &self,
        ctx: &mut Context,
        program: &[Operation],
        oracle: &O,
    ) -> RunReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let entities_before = ctx.entity_count();
        let relations_before = ctx.relation_count();
        let blind_spots_before = ctx.blind_spots().len();
        let dialogues_before = ctx.dialogues().len();
        let events_before = ctx.events().len();

        let mut results = Vec::with_capacity(program.len());
        let mut advisories = Vec::new();
        let mut stats = ExecutionStats::default();

        tracing::info!(operations = program.len(), operator = ctx.operator_id(), "run started");

        for op in program {
            let label = GestureKind::from_symbol(&op.operator)
                .map(|k| k.name().to_string())
                .unwrap_or_else(|| op.operator.clone());

            match self.evaluate_with(ctx, op, oracle, &mut advisories).await {
                Ok(result) => {
                    results.push(OperationResult::Completed { gesture: label, result });
                }
                Err(error) => {
                    stats.operations_failed += 1;
                    tracing::warn!(gesture = %label, kind = %error.kind(), error = %error, "operation failed");
                    let recovery = self.recover(ctx, &error, &label, oracle, &mut advisories).await;
                    if recovery.is_some() {
                        stats.recoveries += 1;
                    }
                    results.push(OperationResult::Failed {
                        gesture: label,
                        failure: Failure::from(&error),
                        recovery,
                    });
                    if self.config.stop_on_error {
                        tracing::info!("stopping on first error");
                        break;
                    }
                }
            }
        }

        let new_events = &ctx.events()[events_before..];
        stats.tensions_created = new_events.iter().map(|e| e.tensions_created as u64).sum();
        stats.tensions_resolved = new_events.iter().map(|e| e.tensions_resolved as u64).sum();
        stats.entities_created = (ctx.entity_count() - entities_before) as u64;
        stats.relations_created = (ctx.relation_count() - relations_before) as u64;
        stats.blind_spots_registered = (ctx.blind_spots().len() - blind_spots_before) as u64;
        stats.dialogues = (ctx.dialogues().len() - dialogues_before) as u64;
        stats.execution_time_ms = clock.elapsed().as_millis() as u64;

        let summary = ctx.summary();
        let cycle = CycleSummary {
            operations_evaluated: results.len(),
            operations_failed: stats.operations_failed as usize,
            events_recorded: new_events.len(),
            ..CycleSummary::begin(ctx.operator_id(), started_at, summary.coherence)
        };

        tracing::info!(
            cycle = %cycle.cycle_id,
            evaluated = results.len(),
            failed = stats.operations_failed,
            coherence = summary.coherence,
            "run finished"
        );

        RunReport {
            events: new_events.len(),
            results,
            advisories,
            stats,
            summary,
            cycle,
        }
    }

    /// Evaluate one top-level tree. No recovery; advisories are dropped.
    pub async fn evaluate<O: Oracle + ?Sized>(
        &self,
        ctx: &mut Context,
        op: &Operation,
        oracle: &O,
    ) -> Result<ResultRef> {
        let mut sink = Vec::new();
        self.evaluate_with(ctx, op, oracle, &mut sink).await
    }

    /// Apply one already-resolved call and record its event.
    pub async fn apply<O: Oracle + ?Sized>(
        &self,
        ctx: &mut Context,
        call: &GestureCall,
        oracle: &O,
    ) -> Result<ResultRef> {
        let mut sink = Vec::new();
        self.apply_with(ctx, call, oracle, &mut sink).await
    }

    async fn evaluate_with<O: Oracle + ?Sized>(
        &self,
        ctx: &mut Context,
        op: &Operation,
        oracle: &O,
        sink: &mut Vec<Advisory>,
    ) -> Result<ResultRef> {
        // reject over-deep trees before any inner form runs
        self.guard.check(op.depth(), 0)?;
        self.eval_tree(ctx, op, 0, oracle, sink).await
    }

    fn eval_tree<'a, O: Oracle + ?Sized>(
        &'a self,
        ctx: &'a mut Context,
        op: &'a Operation,
        depth: usize,
        oracle: &'a O,
        sink: &'a mut Vec<Advisory>,
    ) -> BoxFuture<'a, Result<ResultRef>> {
        Box::pin(async move {
            let kind = GestureKind::from_symbol(&op.operator)
                .ok_or_else(|| Error::UnknownOperator(op.operator.clone()))?;
            let mut call = GestureCall::new(kind).at_depth(depth);

            let mut operands = op.operands.iter();
            while let Some(operand) = operands.next() {
                match operand {
                    Operand::Atom(Atom::Keyword(key)) => {
                        let value = match operands.next() {
                            Some(Operand::Atom(atom)) => atom.to_value(),
                            Some(Operand::Tree(tree)) if tree.is_intent() => {
                                return Err(call.invalid(format!(":{key} cannot take an intent form")));
                            }
                            Some(Operand::Tree(tree)) => {
                                let inner = self.eval_tree(ctx, tree, depth + 1, oracle, sink).await?;
                                Value::String(operand_name(&call, inner)?)
                            }
                            None => return Err(call.invalid(format!(":{key} has no value"))),
                        };
                        call.attributes.insert(key.clone(), value);
                    }
                    Operand::Atom(atom) => call.operands.push(atom.to_text()),
                    Operand::Tree(tree) if tree.is_intent() => {
                        for token in &tree.operands {
                            match token {
                                Operand::Atom(atom) => call.intent.push(atom.to_text()),
                                Operand::Tree(_) => {
                                    return Err(call.invalid("intent tokens must be atoms"));
                                }
                            }
                        }
                    }
                    Operand::Tree(tree) => {
                        let inner = self.eval_tree(ctx, tree, depth + 1, oracle, sink).await?;
                        call.operands.push(operand_name(&call, inner)?);
                    }
                }
            }

            self.apply_with(ctx, &call, oracle, sink).await
        })
    }

    async fn apply_with<O: Oracle + ?Sized>(
        &self,
        ctx: &mut Context,
        call: &GestureCall,
        oracle: &O,
        sink: &mut Vec<Advisory>,
    ) -> Result<ResultRef> {
        let before = ctx.coherence();
        let outcome = match call.kind {
            GestureKind::Collapse => gesture::collapse::collapse(ctx, &self.guard, call),
            GestureKind::Link => gesture::link::link(ctx, &self.guard, call),
            GestureKind::Synthesize => gesture::synthesize::synthesize(ctx, &self.guard, call),
            GestureKind::Extract => gesture::extract::extract(ctx, &self.guard, call),
            GestureKind::Enrich => gesture::enrich::enrich(ctx, &self.guard, call),
            GestureKind::Dialogue => {
                gesture::dialogue::dialogue(ctx, &self.guard, call, oracle, &self.dialogue).await
            }
        }?;
        let after = ctx.coherence();

        let seq = ctx.next_event_seq();
        let draft = outcome.draft;
        let event = Event {
            seq,
            gesture: call.kind,
            operator: call.kind.symbol().to_string(),
            operands: call.operands.clone(),
            result: outcome.result.clone(),
            entities_touched: draft.entities_touched,
            blind_spots: draft.blind_spots,
            coherence_before: before,
            coherence_after: after,
            tensions_resolved: draft.tensions_resolved,
            tensions_created: draft.tensions_created,
            intent: call.intent_text(),
            crisis: draft.crisis,
            recorded_at: Utc::now(),
        };
        tracing::debug!(
            seq,
            gesture = %call.kind,
            result = %event.result,
            delta = event.coherence_delta(),
            "event recorded"
        );
        ctx.push_event(event);

        if let Some(message) = draft.advisory {
            sink.push(Advisory { seq, gesture: call.kind, message });
        }
        Ok(outcome.result)
    }

    /// Answer a failure per the recovery policy. A failing recovery is
    /// logged and never recovered in turn.
    async fn recover<O: Oracle + ?Sized>(
        &self,
        ctx: &mut Context,
        error: &Error,
        gesture: &str,
        oracle: &O,
        sink: &mut Vec<Advisory>,
    ) -> Option<ResultRef> {
        match self.config.recovery.action_for(error.kind()) {
            RecoveryAction::Skip => None,
            RecoveryAction::Extract => {
                let call = GestureCall::new(GestureKind::Extract)
                    .operand(format!("error_{gesture}"))
                    .intent([format!("recovery after {} in {gesture}", error.kind())])
                    .attr("trigger", error.to_string());
                match self.apply_with(ctx, &call, oracle, sink).await {
                    Ok(result) => {
                        tracing::info!(gesture, result = %result, "recovered with extract");
                        Some(result)
                    }
                    Err(e) => {
                        tracing::warn!(gesture, error = %e, "recovery extract failed");
                        None
                    }
                }
            }
        }
    }
}

/// Name a nested gesture's result contributes as an operand.
fn operand_name(call: &GestureCall, result: ResultRef) -> Result<String> {
    match result {
        ResultRef::Entity(name) => Ok(name),
        ResultRef::Relation(id) => Err(call.invalid(format!(
            "nested link result rel:{id} cannot be used as an operand"
        ))),
    }
}
