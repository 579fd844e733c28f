//! Stage instructions and prompt builders.
//!
//! Instructions go out as the system message; the prompt as the user
//! message. Both stages ask for a single JSON object so the extraction
//! layer has something to find.

use std::fmt::Write;

use hoprag_core::{EvidenceDocument, Plan};

/// Instructions for the planning stage.
pub const PLANNER_INSTRUCTIONS: &str = r#"你是检索规划专家。你的任务是分析用户的问题，判断回答它需要几跳检索，并给出检索步骤。

要求：
1. 问题只涉及单个实体的直接事实时，query_type 为 "simple"；需要经由中间实体把多条信息串起来时，为 "multi_hop"。
2. key_entities 列出问题中出现的实体，以及推理可能经过的中间实体。
3. reasoning_steps 按执行顺序排列，step 从 1 开始递增；action 固定为 "search"；target 是一个简短的检索词（通常是一个实体名），不要整句复述问题；purpose 说明这一步要查明什么。
4. expected_hops 是预计的推理跳数。

只输出一个 JSON 对象，不要输出其他文字：
```json
{
  "query_type": "multi_hop",
  "key_entities": ["实体A", "实体B"],
  "reasoning_steps": [
    {"step": 1, "action": "search", "target": "实体A", "purpose": "查明实体A的相关信息"},
    {"step": 2, "action": "search", "target": "实体B", "purpose": "查明实体B与实体A的关系"}
  ],
  "expected_hops": 2
}
```"#;

/// Instructions for the analysis stage.
pub const ANALYZER_INSTRUCTIONS: &str = r#"你是信息分析专家。你的任务是只依据给出的文档回答用户的问题，必要时把多篇文档中的事实串联起来完成多跳推理。

要求：
1. 只使用文档中明确出现的事实，不要臆测。
2. reasoning_chain 按推理顺序列出用到的每条事实，source 标明它来自哪篇文档（如 "文档 2"）。
3. conclusion 是对问题的直接回答；信息不足时说明已知部分和未知部分。
4. confidence 是 0 到 1 之间的小数，表示结论被文档支持的程度。
5. 信息不足时，把仍需检索的实体或关键词写入 missing_info（每项是一个简短的检索词），并把 need_more_search 设为 true；否则 missing_info 为空数组，need_more_search 为 false。

只输出一个 JSON 对象，不要输出其他文字：
```json
{
  "reasoning_chain": [
    {"step": 1, "fact": "从文档中提取的事实", "source": "文档 1"}
  ],
  "conclusion": "最终结论",
  "confidence": 0.9,
  "missing_info": [],
  "need_more_search": false
}
```"#;

/// The planning prompt for one query.
pub fn planner_prompt(user_query: &str) -> String {
    format!(
        "请为下面的问题制定检索计划。\n\n用户问题：{user_query}\n\n\
         如果问题涉及多个实体之间的关系，请标记为 multi_hop，并把可能的中间实体也列为检索目标。"
    )
}

/// The analysis prompt: the question, the plan, and every document so far.
pub fn analyzer_prompt(user_query: &str, plan: &Plan, documents: &[EvidenceDocument]) -> String {
    let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();

    let mut prompt = String::new();
    let _ = writeln!(prompt, "请根据检索到的文档回答用户问题。\n");
    let _ = writeln!(prompt, "用户问题：{user_query}\n");
    let _ = writeln!(prompt, "检索计划：\n{plan_json}\n");
    let _ = writeln!(prompt, "检索到的文档（共 {} 篇）：\n", documents.len());

    for (i, doc) in documents.iter().enumerate() {
        let _ = write!(
            prompt,
            "文档 {} (检索步骤: {}, 目标: {}",
            i + 1,
            doc.retrieval_step,
            doc.search_target
        );
        if let Some(source) = doc.source() {
            let _ = write!(prompt, ", 来源: {source}");
        }
        let _ = writeln!(prompt, "):\n{}\n", doc.content);
    }

    prompt.push_str("如果这是多跳问题，请在 reasoning_chain 中展示文档之间的连接。");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoprag_core::{Passage, RetrievalStep};

    #[test]
    fn planner_prompt_contains_query() {
        let prompt = planner_prompt("张三参与了哪个项目？");
        assert!(prompt.contains("张三参与了哪个项目？"));
    }

    #[test]
    fn analyzer_prompt_lists_every_document() {
        let plan = Plan::fallback("张三参与了哪个项目？");
        let documents = vec![
            EvidenceDocument::from_passage(
                Passage::new("张三与李四在同一个项目组中合作").with_tag("source", "项目记录"),
                RetrievalStep::Plan(1),
                "张三",
                "查找张三",
            ),
            EvidenceDocument::from_passage(
                Passage::new("李四是项目经理，负责管理飞天项目"),
                RetrievalStep::Expansion,
                "李四",
                "扩展搜索实体: 李四",
            ),
        ];
        let prompt = analyzer_prompt("张三参与了哪个项目？", &plan, &documents);
        assert!(prompt.contains("文档 1 (检索步骤: 1, 目标: 张三, 来源: 项目记录):\n张三与李四"));
        assert!(prompt.contains("文档 2 (检索步骤: expansion, 目标: 李四):\n李四是项目经理"));
        assert!(prompt.contains("共 2 篇"));
        assert!(prompt.contains("\"query_type\": \"simple\""));
    }

    #[test]
    fn instructions_ask_for_json() {
        assert!(PLANNER_INSTRUCTIONS.contains("reasoning_steps"));
        assert!(ANALYZER_INSTRUCTIONS.contains("need_more_search"));
    }
}
