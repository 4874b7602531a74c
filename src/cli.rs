//! Command-line interface for phenoparse

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{DataPaths, LlmSettings};
use crate::learning::{
    load_gold_cases, Evaluator, FeedbackRepository, JsonFeedbackStore, JsonHeuristicStore,
    LearningCycle,
};
use crate::models::{FactMap, Schema};
use crate::pipeline::extraction::{ExtractionPipeline, GenerativeExtractor, RuleExtractor, RuleTableStore};
use crate::pipeline::FieldCatalog;
use crate::session::ObservationSession;

#[derive(Parser)]
#[command(name = "phenoparse")]
#[command(about = "Turn free-text lab observations into structured test facts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory holding feedback, heuristics, rule table and schema
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Schema file (default: <data-dir>/schema.json)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Keyword table JSON replacing the built-in field catalog
    #[arg(long, global = true)]
    keywords: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract facts from one observation and print them as JSON
    Extract {
        /// Observation text
        text: String,
        /// Skip the generative backend
        #[arg(long)]
        rules_only: bool,
        /// Facts from earlier turns, as a JSON object
        #[arg(long)]
        prior: Option<String>,
    },
    /// Show how schema fields are grouped into categories
    Classify,
    /// Score the extractor against a gold test file
    Evaluate {
        #[arg(long)]
        gold: PathBuf,
        #[arg(long)]
        rules_only: bool,
    },
    /// Evaluate, record feedback, promote heuristics and synthesize rules
    Learn {
        #[arg(long)]
        gold: PathBuf,
        #[arg(long)]
        rules_only: bool,
    },
    /// Delete all recorded feedback
    ClearFeedback,
    /// Show the active rule table version and digest
    Rules,
}

/// Resolved paths plus the loaded schema and catalog.
struct CliContext {
    paths: DataPaths,
    schema_path: PathBuf,
    catalog: FieldCatalog,
}

impl CliContext {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let paths = match &cli.data_dir {
            Some(dir) => DataPaths::new(dir),
            None => DataPaths::from_env(),
        };
        let schema_path = cli.schema.clone().unwrap_or_else(|| paths.schema());
        let catalog = match &cli.keywords {
            Some(path) => FieldCatalog::load(path)
                .with_context(|| format!("failed to load keyword table {}", path.display()))?,
            None => FieldCatalog::default(),
        };
        Ok(Self {
            paths,
            schema_path,
            catalog,
        })
    }

    fn schema(&self) -> Result<Schema> {
        Schema::load(&self.schema_path)
            .with_context(|| format!("failed to load schema {}", self.schema_path.display()))
    }

    fn rule_extractor(&self) -> Result<RuleExtractor> {
        let store = RuleTableStore::new(self.paths.rules());
        let table = store
            .load()
            .with_context(|| format!("failed to load rule table {}", store.path().display()))?;
        Ok(RuleExtractor::from_table(&table)?)
    }

    fn pipeline(&self, rules_only: bool) -> Result<ExtractionPipeline> {
        let rules = self.rule_extractor()?;
        if rules_only {
            return Ok(ExtractionPipeline::rules_only(rules, self.catalog.clone()));
        }
        match GenerativeExtractor::from_settings(&LlmSettings::from_env()) {
            Ok(generative) => Ok(ExtractionPipeline::new(generative, rules, self.catalog.clone())),
            Err(e) => {
                tracing::warn!(error = %e, "Generative backend unavailable, using rules only");
                Ok(ExtractionPipeline::rules_only(rules, self.catalog.clone()))
            }
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = CliContext::from_cli(&cli)?;

    match cli.command {
        Commands::Extract {
            text,
            rules_only,
            prior,
        } => {
            let prior: FactMap = match prior {
                Some(json) => serde_json::from_str(&json)
                    .context("--prior must be a JSON object of field to outcome")?,
                None => FactMap::new(),
            };
            let pipeline = ctx.pipeline(rules_only)?;
            let mut session = ObservationSession::with_prior(&pipeline, ctx.schema()?, prior);
            let report = session.observe(&text)?;
            let out = serde_json::json!({
                "source": report.source.as_str(),
                "facts": session.facts(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Classify => {
            let schema = ctx.schema()?;
            for (category, fields) in ctx.catalog.classify(&schema.extractable_fields()) {
                println!("{category}: {}", fields.join(", "));
            }
        }
        Commands::Evaluate { gold, rules_only } => {
            let cases = load_gold_cases(&gold)?;
            let fields = ctx.schema()?.extractable_fields();
            let pipeline = ctx.pipeline(rules_only)?;
            let summary = Evaluator::new(&pipeline).run(&cases, &fields);

            println!(
                "Passed {}/{} ({:.1}%)",
                summary.passed,
                summary.total,
                summary.pass_rate() * 100.0
            );
            for record in &summary.records {
                println!("✗ {}", record.case_name);
                for m in &record.mismatches {
                    let got = m.got.as_ref().map_or("<missing>", |g| g.as_str());
                    println!("    {}: expected {}, got {}", m.field, m.expected, got);
                }
            }
        }
        Commands::Learn { gold, rules_only } => {
            let cases = load_gold_cases(&gold)?;
            let fields = ctx.schema()?.extractable_fields();
            let pipeline = ctx.pipeline(rules_only)?;
            let mut cycle = LearningCycle::new(
                Box::new(JsonFeedbackStore::new(ctx.paths.feedback())),
                Box::new(JsonHeuristicStore::new(ctx.paths.heuristics())),
                RuleTableStore::new(ctx.paths.rules()),
            );
            let report = cycle.run(&pipeline, &cases, &fields);

            println!("Passed {}/{}", report.passed, report.total);
            println!("Failures recorded: {}", report.failures);
            for c in &report.candidates {
                println!("  candidate {} ({}, {} mismatches)", c.field, c.rule, c.count);
            }
            println!("Rules added: {}", report.rules_added);
            println!("Rule table v{} ({})", report.table_version, report.table_digest);
            if let Some(stage) = &report.halted {
                eprintln!("warning: learning stopped early ({stage}); previous state kept");
            }
        }
        Commands::ClearFeedback => {
            let mut store = JsonFeedbackStore::new(ctx.paths.feedback());
            store.clear()?;
            println!("Cleared {}", store.path().display());
        }
        Commands::Rules => {
            let store = RuleTableStore::new(ctx.paths.rules());
            let table = store.load()?;
            println!("{}", store.path().display());
            println!("version: {}", table.version());
            println!("learned rules: {}", table.rules().len());
            println!("sha256: {}", table.digest());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_extract_with_globals() {
        let cli = Cli::try_parse_from([
            "phenoparse",
            "--data-dir",
            "/tmp/pp",
            "extract",
            "oxidase positive",
            "--rules-only",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/pp")));
        match cli.command {
            Commands::Extract {
                text, rules_only, ..
            } => {
                assert_eq!(text, "oxidase positive");
                assert!(rules_only);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn learn_requires_gold() {
        assert!(Cli::try_parse_from(["phenoparse", "learn"]).is_err());
    }

    #[test]
    fn context_resolves_schema_under_data_dir() {
        let cli = Cli::try_parse_from(["phenoparse", "--data-dir", "/tmp/pp", "classify"]).unwrap();
        let ctx = CliContext::from_cli(&cli).unwrap();
        assert_eq!(ctx.schema_path, PathBuf::from("/tmp/pp/schema.json"));
    }

    #[test]
    fn rules_only_pipeline_from_fresh_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "phenoparse",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "classify",
        ])
        .unwrap();
        let ctx = CliContext::from_cli(&cli).unwrap();
        let pipeline = ctx.pipeline(true).unwrap();
        assert!(!pipeline.has_generative());
        assert!(ctx.schema().is_err());
    }
}
