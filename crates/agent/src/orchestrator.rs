//! The iterative multi-hop orchestrator.
//!
//! One query runs as a small state machine:
//!
//! ```text
//! Planning ─▶ Retrieving ─▶ Analyzing ─▶ Deciding ─┬─▶ Retrieving
//!                 │                                └─▶ Done
//!                 └─ no new documents ─▶ Done
//! ```
//!
//! - **Planning** happens once and always yields a plan.
//! - **Retrieving** runs the plan in round 1. Later rounds search the
//!   previous analysis' `missing_info`; with nothing missing the run is done.
//! - **Analyzing** looks at every document gathered so far. Its verdict
//!   replaces the previous one.
//! - **Deciding** continues only if more search is wanted, confidence is at
//!   or below the cutoff, and the round budget is not spent.
//!
//! The orchestrator is the only component that remembers anything between
//! rounds. Nothing is shared between runs.

use std::sync::Arc;

use hoprag_core::{
    Analysis, EvidenceDocument, LanguageModel, Plan, QueryError, QueryResult, SimilaritySearch,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::events::RunEvent;
use crate::planner::QueryPlanner;
use crate::retriever::Retriever;

/// Tunables for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    /// Minimum similarity passed to every search
    pub similarity_threshold: f32,

    /// Upper bound on retrieve/analyze rounds
    pub max_iterations: u32,

    /// Confidence above which no further round is started
    pub confidence_cutoff: f32,

    /// Run the searches of one round concurrently
    pub parallel_search: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            max_iterations: 3,
            confidence_cutoff: 0.8,
            parallel_search: false,
        }
    }
}

/// Drives planner, retriever and analyzer for one query at a time.
pub struct Orchestrator {
    planner: QueryPlanner,
    retriever: Retriever,
    analyzer: Analyzer,
    config: OrchestratorConfig,
    events: Option<mpsc::Sender<RunEvent>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Orchestrator {
    /// Create an orchestrator using `model` for planning and analysis and
    /// `search` for retrieval.
    pub fn new(model: Arc<dyn LanguageModel>, search: Arc<dyn SimilaritySearch>) -> Self {
        Self {
            planner: QueryPlanner::new(model.clone()),
            retriever: Retriever::new(search),
            analyzer: Analyzer::new(model),
            config: OrchestratorConfig::default(),
            events: None,
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.retriever = self.retriever.with_parallel(config.parallel_search);
        self.config = config;
        self
    }

    /// Publish [`RunEvent`]s on `events`. The receiver must keep draining.
    pub fn with_events(mut self, events: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Stop at the next round boundary once `cancel` reads `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Answer `user_query` with the configured threshold and round budget.
    pub async fn run(&self, user_query: &str) -> Result<QueryResult, QueryError> {
        self.run_query(
            user_query,
            self.config.similarity_threshold,
            self.config.max_iterations,
        )
        .await
    }

    /// Answer `user_query`.
    ///
    /// Fails only when the call itself is invalid: a blank query, a
    /// threshold or configured cutoff outside `[0, 1]`, or a zero round
    /// budget. Everything that goes wrong upstream degrades to a default
    /// and the run still returns a [`QueryResult`].
    pub async fn run_query(
        &self,
        user_query: &str,
        similarity_threshold: f32,
        max_iterations: u32,
    ) -> Result<QueryResult, QueryError> {
        let user_query = user_query.trim();
        if user_query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(QueryError::ThresholdOutOfRange(similarity_threshold));
        }
        if max_iterations == 0 {
            return Err(QueryError::ZeroIterations);
        }
        let cutoff = self.config.confidence_cutoff;
        if !(0.0..=1.0).contains(&cutoff) {
            return Err(QueryError::CutoffOutOfRange(cutoff));
        }

        info!(query = %user_query, threshold = similarity_threshold, max_iterations, "Starting query");

        // ── Planning ──
        let planned = self.planner.plan(user_query).await;
        let plan_defaulted = !planned.is_parsed();
        let plan = planned.into_inner();
        self.emit(RunEvent::Planned {
            query_type: plan.query_type,
            steps: plan.reasoning_steps.len(),
            expected_hops: plan.expected_hops,
            defaulted: plan_defaulted,
        })
        .await;

        let mut run = RunState::default();

        loop {
            // ── Retrieving ──
            let new_documents = if run.iterations == 0 {
                run.iterations = 1;
                self.emit(RunEvent::RoundStarted { round: 1, expansion: false })
                    .await;
                self.retriever
                    .retrieve_documents(&plan, similarity_threshold)
                    .await
            } else {
                run.iterations += 1;
                self.emit(RunEvent::RoundStarted {
                    round: run.iterations,
                    expansion: true,
                })
                .await;
                let missing = match &run.analysis {
                    Some(analysis) if !analysis.missing_info.is_empty() => {
                        analysis.missing_info.clone()
                    }
                    _ => {
                        info!(round = run.iterations, "Nothing left to look for, stopping");
                        break;
                    }
                };
                debug!(round = run.iterations, entities = ?missing, "Expanding search");
                self.retriever
                    .expand_search(&missing, similarity_threshold)
                    .await
            };

            self.emit(RunEvent::Retrieved {
                round: run.iterations,
                new_documents: new_documents.len(),
                total_documents: run.documents.len() + new_documents.len(),
            })
            .await;

            if new_documents.is_empty() {
                info!(round = run.iterations, "No new documents, stopping");
                break;
            }
            info!(
                round = run.iterations,
                new = new_documents.len(),
                total = run.documents.len() + new_documents.len(),
                "Documents retrieved"
            );
            run.documents.extend(new_documents);

            // ── Analyzing ──
            let analyzed = self
                .analyzer
                .analyze(&run.documents, user_query, &plan)
                .await;
            let analysis_defaulted = !analyzed.is_parsed();
            let analysis = analyzed.into_inner();
            self.emit(RunEvent::Analyzed {
                round: run.iterations,
                confidence: analysis.confidence,
                need_more_search: analysis.need_more_search,
                defaulted: analysis_defaulted,
            })
            .await;

            // ── Deciding ──
            let keep_going = analysis.need_more_search
                && analysis.confidence <= cutoff
                && run.iterations < max_iterations;
            run.analysis = Some(analysis);

            if !keep_going {
                break;
            }
            if self.is_cancelled() {
                warn!(round = run.iterations, "Query cancelled at round boundary");
                run.cancelled = true;
                self.emit(RunEvent::Cancelled {
                    iterations: run.iterations,
                })
                .await;
                break;
            }
        }

        let result = run.finish(user_query, plan);
        info!(
            iterations = result.iterations,
            documents = result.total_documents,
            confidence = result.confidence(),
            "Query finished"
        );
        self.emit(RunEvent::Finished {
            iterations: result.iterations,
            total_documents: result.total_documents,
            confidence: result.confidence(),
        })
        .await;
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(event).await;
        }
    }
}

/// Cross-round memory of a single run.
#[derive(Default)]
struct RunState {
    iterations: u32,
    documents: Vec<EvidenceDocument>,
    analysis: Option<Analysis>,
    cancelled: bool,
}

impl RunState {
    fn finish(self, user_query: &str, plan: Plan) -> QueryResult {
        QueryResult {
            user_query: user_query.to_string(),
            plan,
            total_documents: self.documents.len(),
            iterations: self.iterations,
            analysis: self.analysis,
            documents: self.documents,
            cancelled: self.cancelled,
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingModel, ScriptedModel, StaticSearch};
    use hoprag_core::{QueryType, RetrievalStep};

    const QUERY: &str = "张三参与了哪个项目？";

    const PLAN: &str = r#"{"query_type": "multi_hop", "key_entities": ["张三"],
        "reasoning_steps": [{"step": 1, "action": "search", "target": "张三", "purpose": "查找张三"}],
        "expected_hops": 2}"#;

    fn analysis(confidence: f32, need_more: bool, missing: &[&str]) -> String {
        serde_json::json!({
            "reasoning_chain": [{"step": 1, "fact": "张三与李四在同一个项目组", "source": "文档 1"}],
            "conclusion": "张三参与了飞天项目",
            "confidence": confidence,
            "missing_info": missing,
            "need_more_search": need_more,
        })
        .to_string()
    }

    fn search() -> Arc<StaticSearch> {
        Arc::new(
            StaticSearch::new()
                .with("张三", &["张三与李四在同一个项目组中合作"])
                .with("李四", &["李四是项目经理，负责管理飞天项目"])
                .with("飞天项目", &["飞天项目团队包括张三、李四、王五"]),
        )
    }

    fn orchestrator(model: Arc<ScriptedModel>, search: Arc<StaticSearch>) -> Orchestrator {
        Orchestrator::new(model, search)
    }

    #[tokio::test]
    async fn single_round_when_no_more_search_needed() {
        let a1 = analysis(0.6, false, &["李四"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1]));
        let result = orchestrator(model.clone(), search()).run(QUERY).await.unwrap();

        assert_eq!(result.iterations, 1);
        assert_eq!(result.plan.query_type, QueryType::MultiHop);
        assert_eq!(result.total_documents, 1);
        assert_eq!(result.conclusion(), Some("张三参与了飞天项目"));
        assert_eq!(model.call_count(), 2);
        assert!(!result.cancelled);
    }

    #[tokio::test]
    async fn high_confidence_stops_even_when_more_search_wanted() {
        let a1 = analysis(0.85, true, &["李四"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1]));
        let result = orchestrator(model.clone(), search()).run(QUERY).await.unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn confidence_at_cutoff_continues() {
        let a1 = analysis(0.8, true, &["李四"]);
        let a2 = analysis(0.9, false, &[]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1, &a2]));
        let result = orchestrator(model, search()).run(QUERY).await.unwrap();
        assert_eq!(result.iterations, 2);
    }

    #[tokio::test]
    async fn expansion_round_accumulates_documents() {
        let a1 = analysis(0.4, true, &["李四"]);
        let a2 = analysis(0.9, true, &["王五"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1, &a2]));
        let search = search();
        let result = orchestrator(model.clone(), search.clone()).run(QUERY).await.unwrap();

        assert_eq!(result.iterations, 2);
        assert_eq!(result.total_documents, 2);
        assert_eq!(result.documents[0].retrieval_step, RetrievalStep::Plan(1));
        assert_eq!(result.documents[1].retrieval_step, RetrievalStep::Expansion);
        assert_eq!(result.documents[1].purpose, "扩展搜索实体: 李四");
        assert!((result.confidence() - 0.9).abs() < 1e-6);

        // the second analysis sees both documents, oldest first
        let calls = model.calls();
        let second = &calls[2].1;
        let first_doc = second.find("张三与李四在同一个项目组中合作").unwrap();
        let second_doc = second.find("李四是项目经理").unwrap();
        assert!(first_doc < second_doc);

        let queries: Vec<_> = search.queries().into_iter().map(|(q, _)| q).collect();
        assert_eq!(queries, vec!["张三", "李四"]);
    }

    #[tokio::test]
    async fn round_budget_is_respected() {
        let again = analysis(0.3, true, &["李四"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &again, &again, &again, &again]));
        let result = orchestrator(model.clone(), search())
            .run_query(QUERY, 0.5, 2)
            .await
            .unwrap();
        assert_eq!(result.iterations, 2);
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn rounds_never_exceed_budget() {
        for max_iterations in 1..=4 {
            let again = analysis(0.3, true, &["李四"]);
            let answers: Vec<&str> = std::iter::once(PLAN)
                .chain(std::iter::repeat(again.as_str()).take(5))
                .collect();
            let model = Arc::new(ScriptedModel::new(answers));
            let result = orchestrator(model, search())
                .run_query(QUERY, 0.5, max_iterations)
                .await
                .unwrap();
            assert!(result.iterations >= 1);
            assert!(result.iterations <= max_iterations);
            assert_eq!(result.total_documents, result.documents.len());
        }
    }

    #[tokio::test]
    async fn no_documents_means_no_analysis() {
        let model = Arc::new(ScriptedModel::new(vec![PLAN]));
        let result = orchestrator(model.clone(), Arc::new(StaticSearch::new()))
            .run(QUERY)
            .await
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert!(result.documents.is_empty());
        assert!(result.analysis.is_none());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_expansion_keeps_last_analysis() {
        let a1 = analysis(0.4, true, &["赵六"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1]));
        let result = orchestrator(model, search()).run(QUERY).await.unwrap();
        assert_eq!(result.iterations, 2);
        assert_eq!(result.total_documents, 1);
        assert!((result.confidence() - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn nothing_missing_counts_the_stopping_round() {
        let a1 = analysis(0.4, true, &[]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1]));
        let search = search();
        let (tx, mut rx) = mpsc::channel(64);
        let result = orchestrator(model.clone(), search.clone())
            .with_events(tx)
            .run_query(QUERY, 0.5, 3)
            .await
            .unwrap();

        assert_eq!(result.iterations, 2);
        assert_eq!(result.total_documents, 1);
        assert!((result.confidence() - 0.4).abs() < 1e-6);
        assert_eq!(model.call_count(), 2);
        assert_eq!(search.queries().len(), 1);

        let mut rounds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::RoundStarted { round, expansion } = event {
                rounds.push((round, expansion));
            }
        }
        assert_eq!(rounds, vec![(1, false), (2, true)]);
    }

    #[tokio::test]
    async fn unparseable_analysis_stops_loop() {
        let raw = "张三参与了飞天项目，但我无法给出JSON。";
        let model = Arc::new(ScriptedModel::new(vec![PLAN, raw]));
        let result = orchestrator(model, search()).run(QUERY).await.unwrap();
        let analysis = result.analysis.unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(analysis.confidence, 0.5);
        assert_eq!(analysis.conclusion, raw);
        assert!(analysis.missing_info.is_empty());
    }

    #[tokio::test]
    async fn failing_model_still_returns_result() {
        let search = Arc::new(StaticSearch::new().with(QUERY, &["张三参与了飞天项目"]));
        let result = Orchestrator::new(Arc::new(FailingModel), search.clone())
            .run(QUERY)
            .await
            .unwrap();
        assert_eq!(result.plan, Plan::fallback(QUERY));
        assert_eq!(result.iterations, 1);
        assert_eq!(result.total_documents, 1);
        assert_eq!(result.confidence(), 0.5);
        assert_eq!(search.queries()[0].0, QUERY);
    }

    #[tokio::test]
    async fn caller_errors_are_distinguishable() {
        let orch = orchestrator(Arc::new(ScriptedModel::new(vec![])), search());
        assert_eq!(orch.run("   ").await.unwrap_err(), QueryError::EmptyQuery);
        assert_eq!(
            orch.run_query(QUERY, 1.5, 3).await.unwrap_err(),
            QueryError::ThresholdOutOfRange(1.5)
        );
        assert!(matches!(
            orch.run_query(QUERY, f32::NAN, 3).await,
            Err(QueryError::ThresholdOutOfRange(_))
        ));
        assert_eq!(
            orch.run_query(QUERY, 0.5, 0).await.unwrap_err(),
            QueryError::ZeroIterations
        );

        let orch = orchestrator(Arc::new(ScriptedModel::new(vec![])), search()).with_config(
            OrchestratorConfig {
                confidence_cutoff: 1.2,
                ..OrchestratorConfig::default()
            },
        );
        assert_eq!(
            orch.run(QUERY).await.unwrap_err(),
            QueryError::CutoffOutOfRange(1.2)
        );
    }

    #[tokio::test]
    async fn configured_cutoff_is_used() {
        let a1 = analysis(0.85, true, &["李四"]);
        let a2 = analysis(0.95, true, &["王五"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1, &a2]));
        let result = orchestrator(model, search())
            .with_config(OrchestratorConfig {
                confidence_cutoff: 0.9,
                ..OrchestratorConfig::default()
            })
            .run(QUERY)
            .await
            .unwrap();
        assert_eq!(result.iterations, 2);
    }

    #[tokio::test]
    async fn cancellation_stops_at_round_boundary() {
        let a1 = analysis(0.4, true, &["李四"]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1]));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let result = orchestrator(model.clone(), search())
            .with_cancellation(rx)
            .run(QUERY)
            .await
            .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.total_documents, 1);
        assert!(result.analysis.is_some());
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn events_trace_the_run() {
        let a1 = analysis(0.4, true, &["李四"]);
        let a2 = analysis(0.9, false, &[]);
        let model = Arc::new(ScriptedModel::new(vec![PLAN, &a1, &a2]));
        let (tx, mut rx) = mpsc::channel(64);
        let result = orchestrator(model, search())
            .with_events(tx)
            .run(QUERY)
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.event_type());
        }
        assert_eq!(
            kinds,
            vec![
                "planned",
                "round_started",
                "retrieved",
                "analyzed",
                "round_started",
                "retrieved",
                "analyzed",
                "finished",
            ]
        );
        assert_eq!(result.iterations, 2);
    }

    #[tokio::test]
    async fn parallel_search_gives_same_result() {
        let plan = r#"{"query_type": "multi_hop", "reasoning_steps": [
            {"step": 1, "action": "search", "target": "张三", "purpose": "a"},
            {"step": 2, "action": "search", "target": "飞天项目", "purpose": "b"}]}"#;
        let done = analysis(0.9, false, &[]);

        let sequential = orchestrator(Arc::new(ScriptedModel::new(vec![plan, &done])), search())
            .run(QUERY)
            .await
            .unwrap();
        let parallel = orchestrator(Arc::new(ScriptedModel::new(vec![plan, &done])), search())
            .with_config(OrchestratorConfig {
                parallel_search: true,
                ..OrchestratorConfig::default()
            })
            .run(QUERY)
            .await
            .unwrap();
        assert_eq!(sequential.documents, parallel.documents);
        assert_eq!(parallel.documents[1].retrieval_step, RetrievalStep::Plan(2));
    }
}
