//! 景点分类排名工具

use std::sync::Arc;

use rig::tool::Tool;
use serde::Deserialize;

use super::backends::SearchBackend;
use super::{ToolKind, ToolOutcome};

const MAX_RESULTS: usize = 8;

/// 按类别排名景点的工具
#[derive(Clone)]
pub struct AgentToolAttractionRank {
    backend: Arc<dyn SearchBackend>,
}

/// 排名参数
#[derive(Debug, Deserialize)]
pub struct AttractionRankArgs {
    /// 景点类别，如museums、restaurants、monuments
    pub category: String,
    /// 所在地
    pub location: String,
}

impl AgentToolAttractionRank {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// 搜索评价靠前的地点并输出编号列表
    pub async fn run(&self, category: &str, location: &str) -> ToolOutcome {
        let query = format!("top {} {} best rated reviews", category, location);

        match self.backend.search(&query, MAX_RESULTS).await {
            Ok(hits) if hits.is_empty() => ToolOutcome::Success(format!(
                "Could not find {} in {}.",
                category, location
            )),
            Ok(hits) => {
                let ranked: Vec<String> = hits
                    .iter()
                    .enumerate()
                    .map(|(i, hit)| format!("{}. {}\n   {}\n", i + 1, hit.title, hit.snippet))
                    .collect();
                ToolOutcome::Success(ranked.join("\n"))
            }
            Err(e) => ToolOutcome::degraded(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("attraction rank tool error")]
pub struct AttractionRankToolError;

impl Tool for AgentToolAttractionRank {
    const NAME: &'static str = ToolKind::Rank.name();

    type Error = AttractionRankToolError;
    type Args = AttractionRankArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description:
                "Rank attractions or places of a given category in a location by reviews and ratings. Returns a numbered list."
                    .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Category of attractions, e.g. \"museums\", \"restaurants\", \"monuments\""
                    },
                    "location": {
                        "type": "string",
                        "description": "City or area to search in"
                    }
                },
                "required": ["category", "location"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...rank_attractions_by_category@{:?}", args);

        Ok(self.run(&args.category, &args.location).await.into_text())
    }
}
