//! `hoprag ask` — Answer a single question.

use crate::render;
use crate::session::{RunOptions, Session};

pub async fn run(query: &str, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(options).await?;
    let result = session.ask(query).await?;

    if options.json {
        render::print_json(&result)?;
    } else {
        render::print_result(query, &result);
    }
    Ok(())
}
