//! `hoprag chat` — Interactive question answering.

use std::io::Write;

use hoprag_knowledge::DEMO_QUESTIONS;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;
use crate::session::{RunOptions, Session};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "退出"];

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

pub async fn run(options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(options).await?;
    let settings = session.settings();

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      HopRAG — Multi-hop Question Answering     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:   {}", session.config.default_provider);
    println!("  Model:      {}", session.config.default_model);
    println!("  Threshold:  {}", settings.similarity_threshold);
    println!("  Max rounds: {}", settings.max_iterations);
    println!();
    println!("  Try:");
    for question in DEMO_QUESTIONS {
        println!("    - {question}");
    }
    println!();
    println!("  Type 'quit', 'exit' or '退出' to leave.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            break;
        }

        match session.ask(input).await {
            Ok(result) if options.json => render::print_json(&result)?,
            Ok(result) => render::print_result(input, &result),
            Err(e) => {
                eprintln!("  ❌ 处理查询时出错: {e}");
                println!();
            }
        }
    }

    println!();
    println!("  👋 再见！");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words() {
        assert!(is_exit("quit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("退出"));
        assert!(!is_exit("张三参与了哪个项目？"));
    }
}
