//! A research agent that digs up information on a person and streams its
//! reasoning as it goes.
//!
//! Requires `OPENAI_API_KEY` and `SERP_API_KEY`.

use std::sync::Arc;

use stride_agent::{Agent, AgentOutput};
use stride_core::tool::Tool;
use stride_drivers::OpenAiDriver;
use stride_tools::{GoogleSearchTool, ScrapeWebsiteTool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let driver = Arc::new(OpenAiDriver::from_env("gpt-4o-mini")?);
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(GoogleSearchTool::from_env()?),
        Arc::new(ScrapeWebsiteTool::new()),
    ];

    let agent = Agent::new(
        driver,
        "investigator",
        "You are a private investigator that is good at finding information on people.",
        tools,
    )?
    .with_max_iterations(20);

    let task = "Can you give me information on Jensen Huang?\n\
                Summarize his main achievements, and tell me about his past.\n\
                Cite your sources.";

    let mut stream = agent.stream(task, None);
    while let Some(output) = stream.next().await {
        match output? {
            AgentOutput::Step(step) => {
                println!("[{:?}] {}\n", step.kind, step.content);
            }
            AgentOutput::Result(result) => {
                println!("FINAL ANSWER:\n\n{}", result.content);
            }
        }
    }

    Ok(())
}
