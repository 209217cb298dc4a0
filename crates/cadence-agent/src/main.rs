use std::sync::Arc;

use cadence_agent::{config::Config, console::run_console, logging::init_logging};
use cadence_graph::{
    CardSearchTool, GraphConfig, GraphDeps, GraphFactory, GraphKind, ToolRegistry,
};
use cadence_llm::ProviderConfig;
use cadence_voice::GraphRunner;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env files; .env.local wins
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!("Starting Cadence agent");
    tracing::info!(
        "Graph: {}, stream mode: {}, model: {}",
        config.agent.graph,
        config.agent.stream_mode,
        config.llm.model
    );

    let mut provider = ProviderConfig::openai(config.openai_api_key.clone());
    if let Some(base_url) = &config.llm.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    let client = provider.create_client()?;

    let factory = GraphFactory::new()
        .with_config(GraphConfig::default().with_max_iterations(config.agent.max_iterations));

    let mut deps = GraphDeps::new(client, (&config.llm).into());
    if config.agent.graph == GraphKind::Tools {
        let registry = ToolRegistry::new()
            .with_tool(CardSearchTool::new().with_base_url(config.tools.mtg_base_url.clone()));
        deps = deps.with_tools(Arc::new(registry));
    }
    if let Some(prompt) = &config.agent.system_prompt {
        deps = deps.with_system_prompt(prompt.clone());
    }

    let built = config.agent.graph.build(&factory, &deps)?;
    tracing::info!("Graph compiled with nodes: {:?}", built.graph.node_names());

    let runner = GraphRunner::new(Arc::new(built.graph))
        .with_initial_state(built.initial_state)
        .with_options(config.agent.runner_options());

    let ctx = run_console(
        &runner,
        &config.agent.greeting,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    tracing::info!("Session ended after {} messages", ctx.len());
    Ok(())
}
