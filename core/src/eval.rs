//! Evaluation engine.
//!
//! Runs test texts through render -> extract -> score, computes up to
//! four independent heuristic metrics per case, then averages across
//! cases and emits a qualitative summary. Scores are deterministic,
//! rule-based approximations; no metric is claimed to correlate with
//! human judgment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::render;
use crate::traits::GraphExtractor;
use crate::types::{ExtractionResult, ExtractionSchema};

/// Expected node id shape, `type_number` (e.g. `person_001`)
static NODE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]+_[0-9]+$").unwrap());

/// Assumed words-per-entity density when estimating how many entities a
/// text should yield
const WORDS_PER_ENTITY: usize = 20;

/// Cap on the relationship bonus within the completeness score
const RELATIONSHIP_BONUS_CAP: f64 = 0.3;

/// Test texts are truncated to this many characters in case records
const TEXT_PREVIEW_CHARS: usize = 100;

/// The four heuristic quality metrics.
///
/// Declared in canonical report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Completeness,
    Accuracy,
    Consistency,
    Relevance,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Completeness,
        MetricKind::Accuracy,
        MetricKind::Consistency,
        MetricKind::Relevance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Completeness => "completeness",
            MetricKind::Accuracy => "accuracy",
            MetricKind::Consistency => "consistency",
            MetricKind::Relevance => "relevance",
        }
    }

    /// Look up a metric by name; unrecognized names yield `None`
    pub fn from_name(name: &str) -> Option<MetricKind> {
        match name {
            "completeness" => Some(MetricKind::Completeness),
            "accuracy" => Some(MetricKind::Accuracy),
            "consistency" => Some(MetricKind::Consistency),
            "relevance" => Some(MetricKind::Relevance),
            _ => None,
        }
    }

    /// Parse a list of metric names into a deduplicated set in canonical
    /// order. Unknown names are ignored, never an error.
    pub fn parse_many<S: AsRef<str>>(names: &[S]) -> Vec<MetricKind> {
        let mut set = std::collections::BTreeSet::new();
        for name in names {
            match Self::from_name(name.as_ref()) {
                Some(metric) => {
                    set.insert(metric);
                }
                None => {
                    debug!("Ignoring unknown metric name: {}", name.as_ref());
                }
            }
        }
        set.into_iter().collect()
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one test case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Extracted(ExtractionResult),
    Failed { error: String },
}

/// Record for one evaluated test text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub test_index: usize,
    /// Test text truncated to the first 100 characters
    pub text: String,
    pub outcome: CaseOutcome,
    pub scores: BTreeMap<MetricKind, f64>,
}

impl CaseResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Extracted(_))
    }
}

/// Aggregated result of one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Per-metric averages across all test cases
    pub averages: BTreeMap<MetricKind, f64>,
    /// Per-case details, in input order
    pub cases: Vec<CaseResult>,
    pub summary: String,
}

/// Orchestrates render -> extract -> score over a set of test texts
pub struct EvaluationEngine {
    extractor: Arc<dyn GraphExtractor>,
}

impl EvaluationEngine {
    pub fn new(extractor: Arc<dyn GraphExtractor>) -> Self {
        Self { extractor }
    }

    /// Evaluate template content against a set of test texts.
    ///
    /// Cases run strictly in input order; each completes fully before the
    /// next begins. A failing case (render or extraction) scores 0.0 on
    /// every requested metric and never aborts the run.
    pub async fn evaluate(
        &self,
        template_name: &str,
        template_content: &str,
        test_texts: &[String],
        schema: &ExtractionSchema,
        metrics: &[MetricKind],
    ) -> EvaluationReport {
        let allowed_nodes = schema.allowed_node_types();
        let allowed_relations = schema.allowed_relation_types();

        let mut totals: BTreeMap<MetricKind, f64> =
            metrics.iter().map(|m| (*m, 0.0)).collect();
        let mut cases = Vec::with_capacity(test_texts.len());

        for (test_index, text) in test_texts.iter().enumerate() {
            let outcome = match render::render(template_content, schema, text) {
                Ok(prompt) => self
                    .extractor
                    .extract(&prompt)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(result) => {
                    let scores = score_case(
                        &result,
                        text,
                        &allowed_nodes,
                        &allowed_relations,
                        metrics,
                    );
                    for (metric, score) in &scores {
                        if let Some(total) = totals.get_mut(metric) {
                            *total += score;
                        }
                    }
                    debug!(
                        "Case {} extracted {} nodes, {} relationships",
                        test_index,
                        result.nodes.len(),
                        result.relationships.len()
                    );
                    cases.push(CaseResult {
                        test_index,
                        text: truncate_text(text),
                        outcome: CaseOutcome::Extracted(result),
                        scores,
                    });
                }
                Err(error) => {
                    warn!("Case {} failed: {}", test_index, error);
                    cases.push(CaseResult {
                        test_index,
                        text: truncate_text(text),
                        outcome: CaseOutcome::Failed { error },
                        scores: metrics.iter().map(|m| (*m, 0.0)).collect(),
                    });
                }
            }
        }

        let averages: BTreeMap<MetricKind, f64> = totals
            .into_iter()
            .map(|(metric, total)| {
                let average = if test_texts.is_empty() {
                    0.0
                } else {
                    total / test_texts.len() as f64
                };
                (metric, average)
            })
            .collect();

        let summary = build_summary(template_name, &averages, &cases);

        EvaluationReport {
            averages,
            cases,
            summary,
        }
    }
}

/// Score one extraction result on the requested metrics
pub fn score_case(
    result: &ExtractionResult,
    text: &str,
    allowed_nodes: &[String],
    allowed_relations: &[String],
    metrics: &[MetricKind],
) -> BTreeMap<MetricKind, f64> {
    metrics
        .iter()
        .map(|metric| {
            let score = match metric {
                MetricKind::Completeness => completeness(result, text),
                MetricKind::Accuracy => accuracy(result, text, allowed_nodes, allowed_relations),
                MetricKind::Consistency => consistency(result),
                MetricKind::Relevance => relevance(result, text),
            };
            (*metric, score.clamp(0.0, 1.0))
        })
        .collect()
}

/// Coverage of the text's estimated entity count, plus a capped bonus for
/// extracted relationships.
pub fn completeness(result: &ExtractionResult, text: &str) -> f64 {
    let nodes = &result.nodes;
    let relationships = &result.relationships;
    if nodes.is_empty() && relationships.is_empty() {
        return 0.0;
    }

    let estimated = estimate_entities(text);
    if estimated == 0 {
        return if nodes.is_empty() { 0.0 } else { 1.0 };
    }

    let coverage = (nodes.len() as f64 / estimated as f64).min(1.0);
    let bonus = (relationships.len() as f64 / nodes.len().max(1) as f64)
        .min(RELATIONSHIP_BONUS_CAP);
    (coverage + bonus).min(1.0)
}

/// Mean of per-node and per-relationship field/reference/type checks
pub fn accuracy(
    result: &ExtractionResult,
    text: &str,
    allowed_nodes: &[String],
    allowed_relations: &[String],
) -> f64 {
    if result.nodes.is_empty() && result.relationships.is_empty() {
        return 0.0;
    }

    let text_lower = text.to_lowercase();
    let node_ids: HashSet<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut scores = Vec::with_capacity(result.nodes.len() + result.relationships.len());

    for node in &result.nodes {
        let mut score = 0.0;
        if !node.id.is_empty() && !node.name.is_empty() && !node.node_type.is_empty() {
            score += 0.3;
        }
        if !node.name.is_empty() && text_lower.contains(&node.name.to_lowercase()) {
            score += 0.4;
        }
        if allowed_nodes.iter().any(|t| t == &node.node_type) {
            score += 0.3;
        }
        scores.push(score);
    }

    for relationship in &result.relationships {
        let mut score = 0.0;
        if !relationship.source.is_empty()
            && !relationship.target.is_empty()
            && !relationship.rel_type.is_empty()
        {
            score += 0.4;
        }
        if node_ids.contains(relationship.source.as_str())
            && node_ids.contains(relationship.target.as_str())
        {
            score += 0.3;
        }
        if allowed_relations.iter().any(|t| t == &relationship.rel_type) {
            score += 0.3;
        }
        scores.push(score);
    }

    mean(&scores)
}

/// Internal uniformity of the result: id naming convention, type
/// diversity, and relationship reference validity.
///
/// The reference sub-score is omitted entirely (not zero) when there are
/// no relationships. Type diversity is deliberately lower when types
/// repeat.
pub fn consistency(result: &ExtractionResult) -> f64 {
    let nodes = &result.nodes;
    if nodes.is_empty() {
        return 0.0;
    }

    let mut sub_scores = Vec::with_capacity(3);

    let id_matches = nodes.iter().filter(|n| NODE_ID_RE.is_match(&n.id)).count();
    sub_scores.push(id_matches as f64 / nodes.len() as f64);

    let distinct_types: HashSet<&str> = nodes.iter().map(|n| n.node_type.as_str()).collect();
    sub_scores.push(distinct_types.len() as f64 / nodes.len() as f64);

    if !result.relationships.is_empty() {
        let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let valid_references = result
            .relationships
            .iter()
            .filter(|r| {
                node_ids.contains(r.source.as_str()) && node_ids.contains(r.target.as_str())
            })
            .count();
        sub_scores.push(valid_references as f64 / result.relationships.len() as f64);
    }

    mean(&sub_scores)
}

/// How well node names trace back to the source text: full substring
/// match scores 1.0, any matching name token 0.5, otherwise 0.0.
pub fn relevance(result: &ExtractionResult, text: &str) -> f64 {
    if result.nodes.is_empty() {
        return 0.0;
    }

    let text_lower = text.to_lowercase();
    let scores: Vec<f64> = result
        .nodes
        .iter()
        .map(|node| {
            if node.name.is_empty() {
                return 0.0;
            }
            let name_lower = node.name.to_lowercase();
            if text_lower.contains(&name_lower) {
                1.0
            } else if name_lower
                .split_whitespace()
                .any(|word| text_lower.contains(word))
            {
                0.5
            } else {
                0.0
            }
        })
        .collect();

    mean(&scores)
}

fn estimate_entities(text: &str) -> usize {
    (text.split_whitespace().count() / WORDS_PER_ENTITY).max(1)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn truncate_text(text: &str) -> String {
    if text.chars().count() > TEXT_PREVIEW_CHARS {
        let preview: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        format!("{}...", preview)
    } else {
        text.to_string()
    }
}

fn build_summary(
    template_name: &str,
    averages: &BTreeMap<MetricKind, f64>,
    cases: &[CaseResult],
) -> String {
    let mut lines = vec![format!("Evaluation results for template '{}':", template_name)];

    for (metric, average) in averages {
        lines.push(format!("- {}: {:.2}", metric, average));
    }

    let successful = cases.iter().filter(|c| c.is_success()).count();
    let total = cases.len();
    let success_rate = if total > 0 {
        successful as f64 / total as f64
    } else {
        0.0
    };
    lines.push(format!(
        "- success rate: {:.2} ({}/{})",
        success_rate, successful, total
    ));

    let overall = if averages.is_empty() {
        0.0
    } else {
        averages.values().sum::<f64>() / averages.len() as f64
    };
    let recommendation = if overall >= 0.8 {
        "template performs excellently; keep using it"
    } else if overall >= 0.6 {
        "template performs well; consider minor tuning"
    } else if overall >= 0.4 {
        "template performance is mediocre; needs optimization"
    } else {
        "template performs poorly; a redesign is recommended"
    };
    lines.push(format!("- recommendation: {}", recommendation));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExtractError;
    use crate::types::{Node, Relationship};
    use async_trait::async_trait;

    fn node(id: &str, name: &str, node_type: &str) -> Node {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            ..Default::default()
        }
    }

    fn relationship(source: &str, target: &str, rel_type: &str) -> Relationship {
        Relationship {
            source: source.to_string(),
            target: target.to_string(),
            rel_type: rel_type.to_string(),
        }
    }

    fn hr_schema() -> ExtractionSchema {
        ExtractionSchema::new(
            "hr",
            vec![
                "Person-WORKS_AT->Organization".to_string(),
                "Organization-LOCATED_IN->City".to_string(),
            ],
        )
    }

    fn work_result() -> ExtractionResult {
        ExtractionResult {
            nodes: vec![
                node("person_001", "Alice", "Person"),
                node("org_001", "Acme Corp", "Organization"),
            ],
            relationships: vec![relationship("person_001", "org_001", "WORKS_AT")],
        }
    }

    /// Extractor double returning a fixed script of outcomes
    struct ScriptedExtractor {
        script: tokio::sync::Mutex<Vec<Result<ExtractionResult, ExtractError>>>,
    }

    impl ScriptedExtractor {
        fn new(script: Vec<Result<ExtractionResult, ExtractError>>) -> Self {
            Self {
                script: tokio::sync::Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl GraphExtractor for ScriptedExtractor {
        async fn extract(&self, _prompt: &str) -> Result<ExtractionResult, ExtractError> {
            self.script.lock().await.remove(0)
        }
    }

    #[test]
    fn completeness_empty_result_is_zero() {
        let result = ExtractionResult::default();
        assert_eq!(completeness(&result, "some words here"), 0.0);
    }

    #[test]
    fn completeness_covers_short_text_fully() {
        // 5 words -> estimate max(5/20, 1) = 1 entity; 2 nodes cap coverage
        // at 1.0, 1 relationship over 2 nodes adds 0.5 capped to 0.3,
        // total capped to 1.0
        let score = completeness(&work_result(), "Alice works at Acme Corp");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn completeness_partial_coverage_with_bonus() {
        // 60 words -> 3 estimated entities; 2 nodes -> coverage 2/3;
        // bonus 1/2 capped to 0.3
        let text = vec!["word"; 60].join(" ");
        let score = completeness(&work_result(), &text);
        assert!((score - (2.0 / 3.0 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn accuracy_fully_valid_result_is_one() {
        let schema = hr_schema();
        let score = accuracy(
            &work_result(),
            "Alice works at Acme Corp",
            &schema.allowed_node_types(),
            &schema.allowed_relation_types(),
        );
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn accuracy_penalizes_unknown_types_and_dangling_references() {
        let schema = hr_schema();
        let result = ExtractionResult {
            nodes: vec![node("x_001", "Ghost", "Phantom")],
            relationships: vec![relationship("x_001", "missing", "HAUNTS")],
        };
        // node: fields 0.3, name absent from text, type not allowed -> 0.3
        // rel: fields 0.4, dangling target, type not allowed -> 0.4
        let score = accuracy(
            &result,
            "nothing relevant",
            &schema.allowed_node_types(),
            &schema.allowed_relation_types(),
        );
        assert!((score - 0.35).abs() < 1e-9);
    }

    #[test]
    fn accuracy_empty_result_is_zero() {
        let schema = hr_schema();
        assert_eq!(
            accuracy(
                &ExtractionResult::default(),
                "text",
                &schema.allowed_node_types(),
                &schema.allowed_relation_types()
            ),
            0.0
        );
    }

    #[test]
    fn consistency_spec_example_is_one() {
        assert_eq!(consistency(&work_result()), 1.0);
    }

    #[test]
    fn consistency_without_relationships_omits_reference_sub_score() {
        // ids match, but both nodes share one type: (1.0 + 0.5) / 2
        let result = ExtractionResult {
            nodes: vec![
                node("person_001", "Alice", "Person"),
                node("person_002", "Bob", "Person"),
            ],
            relationships: Vec::new(),
        };
        assert!((consistency(&result) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn consistency_no_nodes_is_zero() {
        assert_eq!(consistency(&ExtractionResult::default()), 0.0);
    }

    #[test]
    fn consistency_flags_bad_ids_and_dangling_references() {
        let result = ExtractionResult {
            nodes: vec![node("person_001", "Alice", "Person"), node("BAD", "Bob", "Person")],
            relationships: vec![
                relationship("person_001", "BAD", "KNOWS"),
                relationship("person_001", "missing", "KNOWS"),
            ],
        };
        // ids: 1/2; types: 1/2; references: 1/2
        assert!((consistency(&result) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn relevance_full_token_and_no_match() {
        let text = "Alice works at Acme Corp";
        let full = ExtractionResult {
            nodes: vec![node("person_001", "Alice", "Person")],
            relationships: Vec::new(),
        };
        assert_eq!(relevance(&full, text), 1.0);

        let partial = ExtractionResult {
            nodes: vec![node("person_001", "Alice Cooper", "Person")],
            relationships: Vec::new(),
        };
        assert_eq!(relevance(&partial, text), 0.5);

        let none = ExtractionResult {
            nodes: vec![node("person_001", "Bob Zhang", "Person")],
            relationships: Vec::new(),
        };
        assert_eq!(relevance(&none, text), 0.0);

        let empty_name = ExtractionResult {
            nodes: vec![node("person_001", "", "Person")],
            relationships: Vec::new(),
        };
        assert_eq!(relevance(&empty_name, text), 0.0);
    }

    #[test]
    fn relevance_no_nodes_is_zero() {
        assert_eq!(relevance(&ExtractionResult::default(), "text"), 0.0);
    }

    #[test]
    fn all_metrics_stay_in_unit_interval() {
        let schema = hr_schema();
        let results = [
            ExtractionResult::default(),
            work_result(),
            ExtractionResult {
                nodes: vec![node("", "", ""); 7],
                relationships: vec![relationship("", "", ""); 13],
            },
        ];
        let long_text = vec!["w"; 500].join(" ");
        for result in &results {
            for text in ["", "one", long_text.as_str()] {
                let scores = score_case(
                    result,
                    text,
                    &schema.allowed_node_types(),
                    &schema.allowed_relation_types(),
                    &MetricKind::ALL,
                );
                for score in scores.values() {
                    assert!((0.0..=1.0).contains(score), "score {} out of range", score);
                }
            }
        }
    }

    #[test]
    fn parse_many_ignores_unknown_and_deduplicates() {
        let metrics = MetricKind::parse_many(&[
            "relevance",
            "accuracy",
            "made_up_metric",
            "accuracy",
        ]);
        assert_eq!(metrics, vec![MetricKind::Accuracy, MetricKind::Relevance]);
    }

    #[tokio::test]
    async fn evaluate_with_no_test_texts_averages_zero() {
        let engine = EvaluationEngine::new(Arc::new(ScriptedExtractor::new(Vec::new())));
        let report = engine
            .evaluate(
                "empty run",
                "{{ text }}",
                &[],
                &hr_schema(),
                &MetricKind::ALL,
            )
            .await;

        assert!(report.cases.is_empty());
        for metric in MetricKind::ALL {
            assert_eq!(report.averages[&metric], 0.0);
        }
        assert!(report.summary.contains("success rate: 0.00 (0/0)"));
    }

    #[tokio::test]
    async fn evaluate_continues_past_failing_cases() {
        let engine = EvaluationEngine::new(Arc::new(ScriptedExtractor::new(vec![
            Ok(work_result()),
            Err(ExtractError::Api("503 from upstream".to_string())),
        ])));
        let texts = vec![
            "Alice works at Acme Corp".to_string(),
            "Bob lives in Paris".to_string(),
        ];
        let metrics = [MetricKind::Consistency];
        let report = engine
            .evaluate("resilient", "{{ text }}", &texts, &hr_schema(), &metrics)
            .await;

        assert_eq!(report.cases.len(), 2);
        assert!(report.cases[0].is_success());
        assert!(!report.cases[1].is_success());
        assert_eq!(report.cases[1].scores[&MetricKind::Consistency], 0.0);
        // (1.0 + 0.0) / 2 test texts
        assert_eq!(report.averages[&MetricKind::Consistency], 0.5);
        assert!(report.summary.contains("success rate: 0.50 (1/2)"));
    }

    #[tokio::test]
    async fn evaluate_records_render_failures_per_case() {
        let engine = EvaluationEngine::new(Arc::new(ScriptedExtractor::new(Vec::new())));
        let texts = vec!["anything".to_string()];
        let report = engine
            .evaluate(
                "broken template",
                "{{ nonexistent }}",
                &texts,
                &hr_schema(),
                &[MetricKind::Relevance],
            )
            .await;

        assert_eq!(report.cases.len(), 1);
        match &report.cases[0].outcome {
            CaseOutcome::Failed { error } => assert!(error.contains("nonexistent")),
            CaseOutcome::Extracted(_) => panic!("expected a failed case"),
        }
        assert_eq!(report.averages[&MetricKind::Relevance], 0.0);
    }

    #[tokio::test]
    async fn evaluate_truncates_long_test_texts() {
        let engine =
            EvaluationEngine::new(Arc::new(ScriptedExtractor::new(vec![Ok(work_result())])));
        let long_text = "x".repeat(150);
        let report = engine
            .evaluate(
                "truncation",
                "{{ text }}",
                &[long_text],
                &hr_schema(),
                &[MetricKind::Completeness],
            )
            .await;

        assert_eq!(report.cases[0].text.chars().count(), 103);
        assert!(report.cases[0].text.ends_with("..."));
    }

    #[tokio::test]
    async fn summary_tiers_follow_overall_average() {
        let engine =
            EvaluationEngine::new(Arc::new(ScriptedExtractor::new(vec![Ok(work_result())])));
        let report = engine
            .evaluate(
                "tiered",
                "{{ text }}",
                &["Alice works at Acme Corp".to_string()],
                &hr_schema(),
                &MetricKind::ALL,
            )
            .await;

        // all four metrics score 1.0 on this input
        assert!(report.summary.contains("keep using it"));
        assert!(report.summary.contains("- completeness: 1.00"));
        assert!(report.summary.contains("- relevance: 1.00"));
    }
}
