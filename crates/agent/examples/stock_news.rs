//! A plan-first financial news agent: one upfront plan, worked step by
//! step, with a synthesized report at the end.
//!
//! Requires `OPENAI_API_KEY` and `SERP_API_KEY`.

use std::sync::Arc;

use stride_agent::{AgentOutput, PlanAgent};
use stride_core::tool::Tool;
use stride_drivers::OpenAiDriver;
use stride_tools::{GoogleSearchTool, ScrapeWebsiteTool};

const DESCRIPTION: &str = "You are a financial news analysis AI tasked with synthesizing \
                           the latest news relevant to a specific investment portfolio.";

const TASK: &str = "\
**Portfolio:** [Tesla, NVIDIA]

**Risks to Monitor:** [Supply chain, China, interest rates]

**Instructions:**
1. Scan financial news sources for relevant articles, focusing on the listed risks.
2. Summarize each article in max 15 words with the source (name only) and date.
3. When you have searched enough, create a summary report with the most newsworthy articles.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let driver = Arc::new(OpenAiDriver::from_env("gpt-4o")?);
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(GoogleSearchTool::from_env()?),
        Arc::new(ScrapeWebsiteTool::new()),
    ];

    let agent = PlanAgent::new(driver, "analyst", DESCRIPTION, tools)?;

    let execution = agent.execute(TASK, None).await?;
    for step in &execution.steps {
        println!("[{:?}] {}\n", step.kind, step.content);
    }
    println!("FINAL REPORT:\n\n{}", execution.result.content);

    Ok(())
}
