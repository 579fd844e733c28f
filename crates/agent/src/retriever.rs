//! Retriever — executes plan steps and expansion searches.
//!
//! Output order is always input order, then the backend's own order.
//! Nothing is deduplicated or re-ranked across searches.

use std::sync::Arc;

use futures::future::join_all;
use hoprag_core::{EvidenceDocument, Passage, Plan, RetrievalStep, SimilaritySearch};
use tracing::{debug, warn};

/// One search the retriever will run, with the provenance to tag hits with.
struct SearchJob {
    target: String,
    step: RetrievalStep,
    purpose: String,
}

/// Runs searches against a [`SimilaritySearch`] backend. Stateless.
pub struct Retriever {
    search: Arc<dyn SimilaritySearch>,
    parallel: bool,
}

impl Retriever {
    pub fn new(search: Arc<dyn SimilaritySearch>) -> Self {
        Self {
            search,
            parallel: false,
        }
    }

    /// Run the searches of one call concurrently. Order is unaffected.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Search every `search` step of the plan, in plan order.
    pub async fn retrieve_documents(&self, plan: &Plan, threshold: f32) -> Vec<EvidenceDocument> {
        let jobs = plan
            .search_steps()
            .map(|step| SearchJob {
                target: step.target.clone(),
                step: RetrievalStep::Plan(step.step),
                purpose: step.purpose.clone(),
            })
            .collect();
        self.run(jobs, threshold).await
    }

    /// Search each named information gap, tagging hits as `expansion`.
    pub async fn expand_search(&self, entities: &[String], threshold: f32) -> Vec<EvidenceDocument> {
        let jobs = entities
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(|entity| SearchJob {
                target: entity.to_string(),
                step: RetrievalStep::Expansion,
                purpose: expansion_purpose(entity),
            })
            .collect();
        self.run(jobs, threshold).await
    }

    async fn run(&self, jobs: Vec<SearchJob>, threshold: f32) -> Vec<EvidenceDocument> {
        let results: Vec<Vec<Passage>> = if self.parallel {
            join_all(jobs.iter().map(|job| self.search_one(&job.target, threshold))).await
        } else {
            let mut results = Vec::with_capacity(jobs.len());
            for job in &jobs {
                results.push(self.search_one(&job.target, threshold).await);
            }
            results
        };

        jobs.into_iter()
            .zip(results)
            .flat_map(|(job, passages)| {
                passages.into_iter().map(move |passage| {
                    EvidenceDocument::from_passage(
                        passage,
                        job.step,
                        job.target.clone(),
                        job.purpose.clone(),
                    )
                })
            })
            .collect()
    }

    /// A failed search contributes nothing.
    async fn search_one(&self, target: &str, threshold: f32) -> Vec<Passage> {
        match self.search.search(target, threshold).await {
            Ok(passages) => {
                debug!(search_target = %target, hits = passages.len(), "Search step done");
                passages
            }
            Err(e) => {
                warn!(
                    search_target = %target,
                    backend = %self.search.name(),
                    error = %e,
                    "Search failed, treating as no results"
                );
                Vec::new()
            }
        }
    }
}

/// Purpose recorded on documents found by an expansion search.
pub fn expansion_purpose(entity: &str) -> String {
    format!("扩展搜索实体: {entity}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::StaticSearch;
    use hoprag_core::{ReasoningStep, StepAction};

    fn plan() -> Plan {
        let mut plan = Plan::fallback("q");
        plan.reasoning_steps = vec![
            ReasoningStep::search(1, "张三", "查找张三"),
            ReasoningStep {
                step: 2,
                action: StepAction::Other("compare".into()),
                target: "李四".into(),
                purpose: String::new(),
            },
            ReasoningStep::search(3, "飞天项目", "查找项目"),
        ];
        plan
    }

    fn search() -> Arc<StaticSearch> {
        Arc::new(
            StaticSearch::new()
                .with("张三", &["张三是工程师", "张三与李四合作"])
                .with("李四", &["李四是项目经理"])
                .with("飞天项目", &["飞天项目是重点项目"]),
        )
    }

    #[tokio::test]
    async fn plan_steps_in_order_with_provenance() {
        let search = search();
        let retriever = Retriever::new(search.clone());
        let docs = retriever.retrieve_documents(&plan(), 0.5).await;

        let contents: Vec<_> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["张三是工程师", "张三与李四合作", "飞天项目是重点项目"]);
        assert_eq!(docs[0].retrieval_step, RetrievalStep::Plan(1));
        assert_eq!(docs[2].retrieval_step, RetrievalStep::Plan(3));
        assert_eq!(docs[2].purpose, "查找项目");
        assert_eq!(docs[0].source(), Some("张三.txt"));

        // non-search actions are never sent to the backend
        let queries: Vec<_> = search.queries().into_iter().map(|(q, _)| q).collect();
        assert_eq!(queries, vec!["张三", "飞天项目"]);
    }

    #[tokio::test]
    async fn retrieval_is_idempotent() {
        let retriever = Retriever::new(search());
        let first = retriever.retrieve_documents(&plan(), 0.5).await;
        let second = retriever.retrieve_documents(&plan(), 0.5).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn expansion_tags_and_purpose() {
        let retriever = Retriever::new(search());
        let docs = retriever
            .expand_search(&["李四".into(), "  ".into(), "王五".into()], 0.3)
            .await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].retrieval_step, RetrievalStep::Expansion);
        assert_eq!(docs[0].search_target, "李四");
        assert_eq!(docs[0].purpose, "扩展搜索实体: 李四");
    }

    #[tokio::test]
    async fn threshold_is_passed_through() {
        let search = search();
        Retriever::new(search.clone())
            .expand_search(&["李四".into()], 0.72)
            .await;
        assert_eq!(search.queries(), vec![("李四".to_string(), 0.72)]);
    }

    #[tokio::test]
    async fn failed_search_contributes_nothing() {
        let search = Arc::new(
            StaticSearch::new()
                .with("飞天项目", &["飞天项目是重点项目"])
                .failing_on("张三"),
        );
        let docs = Retriever::new(search).retrieve_documents(&plan(), 0.5).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].search_target, "飞天项目");
    }

    #[tokio::test]
    async fn parallel_preserves_order() {
        let sequential = Retriever::new(search())
            .expand_search(&["飞天项目".into(), "张三".into(), "李四".into()], 0.5)
            .await;
        let parallel = Retriever::new(search())
            .with_parallel(true)
            .expand_search(&["飞天项目".into(), "张三".into(), "李四".into()], 0.5)
            .await;
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[0].search_target, "飞天项目");
        assert_eq!(parallel[3].search_target, "李四");
    }
}
