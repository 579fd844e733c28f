//! Analyzer — one reasoning call per round over all evidence so far.

use std::sync::Arc;

use hoprag_core::{Analysis, EvidenceDocument, LanguageModel, Plan};
use tracing::{debug, info, warn};

use crate::extraction::{Extraction, extract};
use crate::prompts::{ANALYZER_INSTRUCTIONS, analyzer_prompt};

/// Judges whether the evidence answers the query. Stateless.
pub struct Analyzer {
    model: Arc<dyn LanguageModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Analyze every accumulated document. Never fails.
    ///
    /// An unparseable answer becomes the conclusion itself with
    /// confidence 0.5 and no further search requested.
    pub async fn analyze(
        &self,
        documents: &[EvidenceDocument],
        user_query: &str,
        plan: &Plan,
    ) -> Extraction<Analysis> {
        let prompt = analyzer_prompt(user_query, plan, documents);
        debug!(
            model = %self.model.name(),
            documents = documents.len(),
            prompt_chars = prompt.chars().count(),
            "Analyzing documents"
        );

        let raw = match self.model.complete(ANALYZER_INSTRUCTIONS, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Analyzer call failed, using fallback analysis");
                return Extraction::defaulted(Analysis::fallback(""), "", e.to_string());
            }
        };

        match extract(&raw, || Analysis::fallback(&raw)) {
            Extraction::Parsed(analysis) => {
                let analysis = analysis.normalized();
                info!(
                    confidence = analysis.confidence,
                    need_more_search = analysis.need_more_search,
                    missing = analysis.missing_info.len(),
                    "Documents analyzed"
                );
                Extraction::Parsed(analysis)
            }
            defaulted => {
                warn!(reason = ?defaulted.reason(), "Unparseable analysis, keeping raw answer");
                defaulted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingModel, ScriptedModel};
    use hoprag_core::{Passage, RetrievalStep};

    const QUERY: &str = "张三参与了哪个项目？";

    fn documents() -> Vec<EvidenceDocument> {
        vec![EvidenceDocument::from_passage(
            Passage::new("王五负责飞天项目的前端开发工作，与张三的后端开发形成配合。"),
            RetrievalStep::Plan(1),
            "张三",
            "查找张三",
        )]
    }

    #[tokio::test]
    async fn parses_and_normalizes() {
        let model = Arc::new(ScriptedModel::new(vec![
            r#"分析如下：{"reasoning_chain": [{"step": 1, "fact": "张三负责飞天项目后端", "source": "文档 1"}],
               "conclusion": "张三参与了飞天项目", "confidence": 0.95,
               "missing_info": [], "need_more_search": false}"#,
        ]));
        let analyzer = Analyzer::new(model.clone());
        let analysis = analyzer.analyze(&documents(), QUERY, &Plan::fallback(QUERY)).await;
        assert!(analysis.is_parsed());
        let analysis = analysis.into_inner();
        assert!(analysis.conclusion.contains("飞天项目"));
        assert!((analysis.confidence - 0.95).abs() < 1e-6);

        let calls = model.calls();
        assert_eq!(calls[0].0, ANALYZER_INSTRUCTIONS);
        assert!(calls[0].1.contains("王五负责飞天项目"));
    }

    #[tokio::test]
    async fn unparseable_answer_becomes_conclusion() {
        let raw = "根据文档，张三参与了飞天项目。";
        let model = Arc::new(ScriptedModel::new(vec![raw]));
        let analysis = Analyzer::new(model)
            .analyze(&documents(), QUERY, &Plan::fallback(QUERY))
            .await;
        assert!(!analysis.is_parsed());
        let analysis = analysis.into_inner();
        assert_eq!(analysis.conclusion, raw);
        assert_eq!(analysis.confidence, 0.5);
        assert!(analysis.missing_info.is_empty());
        assert!(!analysis.need_more_search);
        assert!(analysis.reasoning_chain.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_clamped() {
        let model = Arc::new(ScriptedModel::new(vec![
            r#"{"conclusion": "x", "confidence": 7, "missing_info": ["李四", "李四"], "need_more_search": "true"}"#,
        ]));
        let analysis = Analyzer::new(model)
            .analyze(&documents(), QUERY, &Plan::fallback(QUERY))
            .await
            .into_inner();
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.missing_info, vec!["李四".to_string()]);
        assert!(analysis.need_more_search);
    }

    #[tokio::test]
    async fn model_failure_stops_search() {
        let analysis = Analyzer::new(Arc::new(FailingModel))
            .analyze(&documents(), QUERY, &Plan::fallback(QUERY))
            .await;
        assert!(!analysis.is_parsed());
        let analysis = analysis.into_inner();
        assert_eq!(analysis.confidence, 0.5);
        assert!(!analysis.need_more_search);
    }
}
