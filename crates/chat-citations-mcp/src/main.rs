// Rust guideline compliant 2026-10-18

mod tools;

use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::tools::ChatCitationsMcpServer;

#[tool_handler]
impl ServerHandler for ChatCitationsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Chat Citations MCP Server: resolve final answers and ranked source citations from chat message sequences (JSON). Prefer small max_citations values to keep responses token efficient.".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP transport; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    tracing::info!("starting chat-citations MCP server on stdio");
    let service = ChatCitationsMcpServer::new().serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
