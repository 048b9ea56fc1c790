//! 当地习俗与文化提示工具

use std::sync::Arc;

use rig::tool::Tool;
use serde::Deserialize;

use super::backends::SearchBackend;
use super::{ToolKind, ToolOutcome};

const MAX_RESULTS: usize = 5;

/// 当地习俗查询工具
#[derive(Clone)]
pub struct AgentToolLocalCustoms {
    backend: Arc<dyn SearchBackend>,
}

/// 习俗查询参数
#[derive(Debug, Deserialize)]
pub struct LocalCustomsArgs {
    pub location: String,
}

impl AgentToolLocalCustoms {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub async fn run(&self, location: &str) -> ToolOutcome {
        let query = format!("{} local customs etiquette culture tips travelers", location);

        match self.backend.search(&query, MAX_RESULTS).await {
            Ok(hits) if hits.is_empty() => ToolOutcome::Success(format!(
                "Local customs information for {} not available.",
                location
            )),
            Ok(hits) => {
                let tips: Vec<String> = hits
                    .iter()
                    .take(3)
                    .map(|hit| hit.snippet.clone())
                    .collect();
                ToolOutcome::Success(tips.join("\n---\n"))
            }
            Err(e) => ToolOutcome::degraded(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("local customs tool error")]
pub struct LocalCustomsToolError;

impl Tool for AgentToolLocalCustoms {
    const NAME: &'static str = ToolKind::Customs.name();

    type Error = LocalCustomsToolError;
    type Args = LocalCustomsArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description:
                "Get local customs, etiquette and cultural tips travelers should know about a location."
                    .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Location to get customs information for"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...get_local_customs_tips@{:?}", args);

        Ok(self.run(&args.location).await.into_text())
    }
}
