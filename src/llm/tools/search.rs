//! 通用旅行信息搜索工具

use std::sync::Arc;

use rig::tool::Tool;
use serde::Deserialize;

use super::backends::SearchBackend;
use super::{ToolKind, ToolOutcome};

const MAX_RESULTS: usize = 5;

/// 旅行信息搜索工具
#[derive(Clone)]
pub struct AgentToolWebSearch {
    backend: Arc<dyn SearchBackend>,
}

/// 搜索参数
#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

impl AgentToolWebSearch {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// 执行搜索并格式化为文本块，后端失败转化为降级文本
    pub async fn run(&self, query: &str) -> ToolOutcome {
        match self.backend.search(query, MAX_RESULTS).await {
            Ok(hits) if hits.is_empty() => {
                ToolOutcome::Success("No search results found.".to_string())
            }
            Ok(hits) => {
                let formatted: Vec<String> = hits
                    .iter()
                    .map(|hit| {
                        format!(
                            "Title: {}\nDescription: {}\nSource: {}\n",
                            hit.title, hit.snippet, hit.url
                        )
                    })
                    .collect();
                ToolOutcome::Success(formatted.join("\n---\n"))
            }
            Err(e) => ToolOutcome::degraded(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("web search tool error")]
pub struct WebSearchToolError;

impl Tool for AgentToolWebSearch {
    const NAME: &'static str = ToolKind::Search.name();

    type Error = WebSearchToolError;
    type Args = WebSearchArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description:
                "Search the web for travel information: attractions, restaurants, prices, ratings, image URLs. Returns formatted text results."
                    .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query, e.g. \"best restaurants in Paris\""
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...search_travel_information@{:?}", args);

        Ok(self.run(&args.query).await.into_text())
    }
}
