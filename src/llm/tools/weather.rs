//! 天气信息查询工具

use std::sync::Arc;

use rig::tool::Tool;
use serde::Deserialize;

use super::backends::SearchBackend;
use super::{ToolKind, ToolOutcome};

const MAX_RESULTS: usize = 3;

/// 天气查询工具
#[derive(Clone)]
pub struct AgentToolWeather {
    backend: Arc<dyn SearchBackend>,
}

/// 天气查询参数
#[derive(Debug, Deserialize)]
pub struct WeatherArgs {
    pub location: String,
    /// 可选的月份名称
    pub month: Option<String>,
}

impl AgentToolWeather {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// 搜索天气信息，只保留确实提到天气的片段
    pub async fn run(&self, location: &str, month: Option<&str>) -> ToolOutcome {
        let mut query = format!("weather {}", location);
        if let Some(month) = month {
            query.push(' ');
            query.push_str(month);
        }

        match self.backend.search(&query, MAX_RESULTS).await {
            Ok(hits) => {
                let weather_lines: Vec<String> = hits
                    .iter()
                    .filter(|hit| {
                        let body = hit.snippet.to_lowercase();
                        ["temperature", "weather", "climate", "°c", "°f"]
                            .iter()
                            .any(|keyword| body.contains(keyword))
                    })
                    .take(2)
                    .map(|hit| hit.snippet.clone())
                    .collect();

                if weather_lines.is_empty() {
                    ToolOutcome::Success(format!(
                        "Weather information for {} not readily available.",
                        location
                    ))
                } else {
                    ToolOutcome::Success(weather_lines.join("\n"))
                }
            }
            Err(e) => ToolOutcome::degraded(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("weather tool error")]
pub struct WeatherToolError;

impl Tool for AgentToolWeather {
    const NAME: &'static str = ToolKind::Weather.name();

    type Error = WeatherToolError;
    type Args = WeatherArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get weather information for a location, optionally for a specific month."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Location to get weather for"
                    },
                    "month": {
                        "type": "string",
                        "description": "Optional month name, e.g. \"June\""
                    }
                },
                "required": ["location"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...get_weather_info@{:?}", args);

        Ok(self
            .run(&args.location, args.month.as_deref())
            .await
            .into_text())
    }
}
