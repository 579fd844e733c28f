//! Human-readable output for results, passages and progress.

use std::fmt::Write;

use hoprag_agent::RunEvent;
use hoprag_core::{Passage, QueryResult};
use serde::Serialize;

const RULE: &str = "============================================================";

/// Render a query result the way the terminal shows it.
pub fn format_result(result: &QueryResult) -> String {
    let mut out = String::new();
    let plan = &result.plan;

    let _ = writeln!(out, "📋 查询类型: {}", plan.query_type);
    let _ = writeln!(out, "🎯 关键实体: {}", plan.key_entities.join(", "));
    let _ = writeln!(out, "🔄 迭代次数: {}", result.iterations);
    let _ = writeln!(out, "📚 检索文档数: {}", result.total_documents);

    let Some(analysis) = &result.analysis else {
        let _ = writeln!(out, "\n⚠️ 未检索到相关文档，无法给出答案");
        if result.cancelled {
            let _ = writeln!(out, "⏹️ 查询已中断");
        }
        return out;
    };

    if !analysis.reasoning_chain.is_empty() {
        let _ = writeln!(out, "\n🧠 推理链条:");
        for (i, fact) in analysis.reasoning_chain.iter().enumerate() {
            let _ = writeln!(out, "   {}. {}", i + 1, fact.fact);
            if let Some(source) = &fact.source {
                let _ = writeln!(out, "      📖 来源: {source}");
            }
        }
    }

    if !analysis.conclusion.is_empty() {
        let _ = writeln!(out, "\n✅ 最终答案: {}", analysis.conclusion);
    }
    let _ = writeln!(out, "📊 置信度: {:.2}", analysis.confidence);

    if !analysis.missing_info.is_empty() {
        let _ = writeln!(out, "⚠️ 缺失信息: {}", analysis.missing_info.join(", "));
    }
    if result.cancelled {
        let _ = writeln!(out, "⏹️ 查询已中断，以上为部分结果");
    }
    out
}

pub fn print_result(query: &str, result: &QueryResult) {
    println!("\n🔍 正在处理查询: {query}");
    println!("{RULE}");
    print!("{}", format_result(result));
    println!("{RULE}\n");
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render search hits with their score and source.
pub fn format_passages(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return "  (no matching passages)\n".into();
    }
    let mut out = String::new();
    for (i, passage) in passages.iter().enumerate() {
        let similarity = passage
            .metadata
            .get("similarity")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let _ = write!(out, "  {}. [{similarity:.2}]", i + 1);
        if let Some(source) = passage.metadata.get("source").and_then(|v| v.as_str()) {
            let _ = write!(out, " ({source})");
        }
        let _ = writeln!(out, " {}", passage.content);
    }
    out
}

/// One progress line per event; `None` for events not worth showing.
pub fn format_event(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::Planned {
            query_type,
            steps,
            defaulted,
            ..
        } => Some(if *defaulted {
            format!("  📝 规划失败，直接检索原问题 ({steps} 步)")
        } else {
            format!("  📝 规划完成: {query_type}, {steps} 步")
        }),
        RunEvent::RoundStarted { round, expansion } => Some(if *expansion {
            format!("  🔎 第 {round} 轮: 扩展检索缺失信息")
        } else {
            format!("  🔎 第 {round} 轮: 按计划检索")
        }),
        RunEvent::Retrieved {
            new_documents,
            total_documents,
            ..
        } => Some(format!(
            "     新增 {new_documents} 篇文档，累计 {total_documents} 篇"
        )),
        RunEvent::Analyzed {
            confidence,
            need_more_search,
            ..
        } => Some(format!(
            "     分析完成: 置信度 {confidence:.2}{}",
            if *need_more_search { "，需要更多信息" } else { "" }
        )),
        RunEvent::Cancelled { iterations } => {
            Some(format!("  ⏹️ 已在第 {iterations} 轮后中断"))
        }
        RunEvent::Finished { .. } => None,
    }
}
