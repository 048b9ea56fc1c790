//! 地点坐标查询工具

use std::sync::Arc;

use rig::tool::Tool;
use serde::Deserialize;

use super::backends::GeocodeBackend;
use super::{ToolKind, ToolOutcome};

/// 坐标查询工具
#[derive(Clone)]
pub struct AgentToolGeocode {
    backend: Arc<dyn GeocodeBackend>,
}

/// 坐标查询参数
#[derive(Debug, Deserialize)]
pub struct GeocodeArgs {
    /// 地点查询文本，推荐"地点名, 城市"格式
    pub query: String,
}

impl AgentToolGeocode {
    pub fn new(backend: Arc<dyn GeocodeBackend>) -> Self {
        Self { backend }
    }

    /// 查询坐标，任何失败都归于None，不向调用方抛错
    pub async fn lookup(&self, query: &str) -> Option<(f64, f64)> {
        match self.backend.lookup(query).await {
            Ok(coordinates) => coordinates,
            Err(_) => None,
        }
    }

    /// 文本形式的查询，供推理循环Agent使用
    pub async fn run(&self, query: &str) -> ToolOutcome {
        match self.backend.lookup(query).await {
            Ok(Some((latitude, longitude))) => {
                ToolOutcome::Success(format!("{},{}", latitude, longitude))
            }
            Ok(None) => ToolOutcome::Success(String::new()),
            Err(e) => ToolOutcome::degraded(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("geocode tool error")]
pub struct GeocodeToolError;

impl Tool for AgentToolGeocode {
    const NAME: &'static str = ToolKind::Geocode.name();

    type Error = GeocodeToolError;
    type Args = GeocodeArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description:
                "Get latitude/longitude coordinates for a place. Returns \"lat,lng\" or an empty string when the place is unknown."
                    .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Place to geocode, e.g. \"Eiffel Tower, Paris\""
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...get_place_coordinates@{:?}", args);

        Ok(self.run(&args.query).await.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct FixedBackend(Option<(f64, f64)>);

    #[async_trait]
    impl GeocodeBackend for FixedBackend {
        async fn lookup(&self, _query: &str) -> Result<Option<(f64, f64)>> {
            Ok(self.0)
        }
    }

    struct BrokenBackend;

    #[async_trait]
    impl GeocodeBackend for BrokenBackend {
        async fn lookup(&self, _query: &str) -> Result<Option<(f64, f64)>> {
            Err(anyhow!("rate limited"))
        }
    }

    #[tokio::test]
    async fn test_run_formats_lat_lng_pair() {
        let tool = AgentToolGeocode::new(Arc::new(FixedBackend(Some((48.8584, 2.2945)))));
        let outcome = tool.run("Eiffel Tower, Paris").await;
        assert_eq!(outcome, ToolOutcome::Success("48.8584,2.2945".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_swallows_backend_error() {
        let tool = AgentToolGeocode::new(Arc::new(BrokenBackend));
        assert_eq!(tool.lookup("anywhere").await, None);

        let outcome = tool.run("anywhere").await;
        assert!(outcome.is_degraded());
        assert!(outcome.text().starts_with("Tool error:"));
    }
}
