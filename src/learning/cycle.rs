use std::fmt::Display;

use super::evaluator::Evaluator;
use super::learner::learn;
use super::store::{FeedbackRepository, HeuristicRepository};
use super::synthesizer::apply;
use super::types::{GoldCase, HeuristicCandidate};
use crate::pipeline::extraction::{FactExtractor, RuleExtractor, RuleTableError, RuleTableStore};

/// Outcome of one evaluate → learn → synthesize pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub passed: usize,
    pub total: usize,
    /// Failing cases recorded this pass.
    pub failures: usize,
    pub candidates: Vec<HeuristicCandidate>,
    pub rules_added: usize,
    /// Version of the rule table that is authoritative after the pass.
    pub table_version: u32,
    pub table_digest: String,
    /// Stage that failed to persist, when the pass stopped early.
    pub halted: Option<String>,
}

/// Drives the offline learning loop over injected stores.
///
/// Each stage reads what the previous stage persisted. A persistence
/// failure is logged and ends the pass; the previous rule table stays
/// authoritative.
pub struct LearningCycle {
    feedback: Box<dyn FeedbackRepository>,
    heuristics: Box<dyn HeuristicRepository>,
    rules: RuleTableStore,
}

impl LearningCycle {
    pub fn new(
        feedback: Box<dyn FeedbackRepository>,
        heuristics: Box<dyn HeuristicRepository>,
        rules: RuleTableStore,
    ) -> Self {
        Self {
            feedback,
            heuristics,
            rules,
        }
    }

    pub fn feedback(&self) -> &dyn FeedbackRepository {
        self.feedback.as_ref()
    }

    pub fn heuristics(&self) -> &dyn HeuristicRepository {
        self.heuristics.as_ref()
    }

    pub fn rule_store(&self) -> &RuleTableStore {
        &self.rules
    }

    /// Rule extractor compiled from the currently persisted table.
    pub fn rule_extractor(&self) -> Result<RuleExtractor, RuleTableError> {
        RuleExtractor::from_table(&self.rules.load()?)
    }

    pub fn run(
        &mut self,
        extractor: &dyn FactExtractor,
        cases: &[GoldCase],
        fields: &[String],
    ) -> CycleReport {
        let span = tracing::info_span!("learning_cycle", cases = cases.len());
        let _guard = span.enter();

        let summary = Evaluator::new(extractor).run(cases, fields);
        let mut report = CycleReport {
            passed: summary.passed,
            total: summary.total,
            failures: summary.records.len(),
            candidates: Vec::new(),
            rules_added: 0,
            table_version: 0,
            table_digest: String::new(),
            halted: None,
        };

        let table = match self.rules.load() {
            Ok(table) => table,
            Err(e) => return halt(report, "load rule table", e),
        };
        report.table_version = table.version();
        report.table_digest = table.digest();

        if let Err(e) = self.feedback.append(&summary.records) {
            return halt(report, "append feedback", e);
        }
        let log = match self.feedback.load_all() {
            Ok(log) => log,
            Err(e) => return halt(report, "reload feedback", e),
        };

        if let Err(e) = self.heuristics.replace(&learn(&log)) {
            return halt(report, "save heuristics", e);
        }
        report.candidates = match self.heuristics.load() {
            Ok(candidates) => candidates,
            Err(e) => return halt(report, "reload heuristics", e),
        };

        let (updated, added) = match apply(&report.candidates, &table) {
            Ok(result) => result,
            Err(e) => return halt(report, "synthesize rules", e),
        };
        if added > 0 {
            if let Err(e) = self.rules.save(&updated) {
                return halt(report, "save rule table", e);
            }
            report.rules_added = added;
            report.table_version = updated.version();
            report.table_digest = updated.digest();
        }

        tracing::info!(
            passed = report.passed,
            total = report.total,
            candidates = report.candidates.len(),
            rules_added = report.rules_added,
            table_version = report.table_version,
            "Learning cycle complete"
        );
        report
    }
}

fn halt(mut report: CycleReport, stage: &str, error: impl Display) -> CycleReport {
    tracing::warn!(stage, error = %error, "Learning cycle stopped, previous state kept");
    report.halted = Some(format!("{stage}: {error}"));
    report
}
