//! 目的地调研编排器
//!
//! 两种运行模式：可用时走ReAct推理循环（由模型自主选择工具），否则
//! 回退到固定顺序的确定性工具序列。两种模式都保证产出调研上下文——
//! 哪怕每个工具调用都失败，失败也只是以内联的诊断文本出现在上下文里。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::AgentConfig;
use crate::generator::prompts;
use crate::llm::client::{Generator, LLMClient, ReActConfig};
use crate::llm::tools::Toolkit;
use crate::types::TripRequest;

/// 确定性模式下各片段的截断上限（字符数）
const SEARCH_SNIPPET_LIMIT: usize = 800;
const RANK_SNIPPET_LIMIT: usize = 600;
const WEATHER_SNIPPET_LIMIT: usize = 400;
const CUSTOMS_SNIPPET_LIMIT: usize = 400;

/// 调研编排器
pub struct ResearchOrchestrator {
    /// ReAct推理循环所需的完整LLM客户端，不可用时为None
    react_client: Option<LLMClient>,
    /// 确定性模式的总结调用走注入的生成缝隙
    generator: Arc<dyn Generator>,
    toolkit: Toolkit,
    agent_config: AgentConfig,
    verbose: bool,
}

impl ResearchOrchestrator {
    pub fn new(
        react_client: Option<LLMClient>,
        generator: Arc<dyn Generator>,
        toolkit: Toolkit,
        agent_config: AgentConfig,
        verbose: bool,
    ) -> Self {
        Self {
            react_client,
            generator,
            toolkit,
            agent_config,
            verbose,
        }
    }

    /// 产出调研上下文，任何内部失败都降级处理，该方法本身永不失败
    pub async fn gather(&self, request: &TripRequest) -> String {
        let brief = prompts::research_brief(request);

        if let Some(client) = &self.react_client {
            println!("🚀 开始执行目的地调研流程(ReAct模式)...");
            match self.react_research(client, &brief).await {
                Ok(context) if !context.trim().is_empty() => {
                    println!("✓ 调研流程执行完毕");
                    return context;
                }
                Ok(_) => {
                    println!("⚠️ ReAct调研返回空结果，回退到固定工具序列");
                }
                Err(e) => {
                    println!("⚠️ ReAct调研失败({})，回退到固定工具序列", e);
                }
            }
        } else {
            println!("🚀 开始执行目的地调研流程(固定工具序列)...");
        }

        let context = self.deterministic_research(request, &brief).await;
        println!("✓ 调研流程执行完毕");
        context
    }

    /// ReAct推理循环模式
    async fn react_research(&self, client: &LLMClient, brief: &str) -> Result<String> {
        let react_config = ReActConfig {
            max_iterations: self.agent_config.max_iterations,
            max_execution: Duration::from_secs(self.agent_config.max_execution_seconds),
            verbose: self.verbose,
            ..Default::default()
        };

        let response = client
            .prompt_with_react(prompts::RESEARCH_PREAMBLE, brief, &self.toolkit, react_config)
            .await?;

        Ok(response.content)
    }

    /// 确定性回退模式：固定顺序的工具序列 + 一次总结调用
    ///
    /// 工具失败贡献内联的`Tool error:`说明，不会中断序列。
    async fn deterministic_research(&self, request: &TripRequest, brief: &str) -> String {
        let destination = &request.destination;
        let mut findings: Vec<String> = Vec::new();

        // 1. 通用搜索
        let search_query = format!("{} travel guide attractions", destination);
        let search_result = self.toolkit.search.run(&search_query).await;
        findings.push(format!(
            "Search Results: {}",
            truncate_chars(search_result.text(), SEARCH_SNIPPET_LIMIT)
        ));

        // 2. 景点排名
        let rank_result = self.toolkit.rank.run("attractions", destination).await;
        findings.push(format!(
            "\nTop Attractions: {}",
            truncate_chars(rank_result.text(), RANK_SNIPPET_LIMIT)
        ));

        // 3. 天气
        let weather_result = self.toolkit.weather.run(destination, None).await;
        findings.push(format!(
            "\nWeather: {}",
            truncate_chars(weather_result.text(), WEATHER_SNIPPET_LIMIT)
        ));

        // 4. 当地习俗
        let customs_result = self.toolkit.customs.run(destination).await;
        findings.push(format!(
            "\nCultural Tips: {}",
            truncate_chars(customs_result.text(), CUSTOMS_SNIPPET_LIMIT)
        ));

        // 5. 坐标由后置补全阶段处理
        findings.push(
            "\nNote: Coordinates will be automatically fetched for all places in the final itinerary."
                .to_string(),
        );

        let combined = findings.join("\n");

        // 对拼接结果做一次总结推理；总结失败时用原始工具结果兜底
        let summary_prompt = prompts::research_summary_prompt(&combined, brief);
        match self.generator.complete(&summary_prompt).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => combined,
            Err(e) => {
                println!("⚠️ 调研总结生成失败({})，使用原始工具结果", e);
                combined
            }
        }
    }
}

/// 按字符数截断，避免在多字节字符中间切断
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::backends::{GeocodeBackend, SearchBackend, SearchHit};
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct FixedSearchBackend;

    #[async_trait]
    impl SearchBackend for FixedSearchBackend {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                title: format!("Result for {}", query),
                snippet: "A lovely place with a 4.6 rating".to_string(),
                url: "https://example.com".to_string(),
            }])
        }
    }

    struct BrokenSearchBackend;

    #[async_trait]
    impl SearchBackend for BrokenSearchBackend {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Err(anyhow!("dns failure"))
        }
    }

    struct NoGeocodeBackend;

    #[async_trait]
    impl GeocodeBackend for NoGeocodeBackend {
        async fn lookup(&self, _query: &str) -> Result<Option<(f64, f64)>> {
            Ok(None)
        }
    }

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl Generator for BrokenGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("model offline"))
        }
    }

    fn orchestrator(
        search_backend: Arc<dyn SearchBackend>,
        generator: Arc<dyn Generator>,
    ) -> ResearchOrchestrator {
        let toolkit = Toolkit::new(search_backend, Arc::new(NoGeocodeBackend));
        ResearchOrchestrator::new(None, generator, toolkit, AgentConfig::default(), false)
    }

    #[tokio::test]
    async fn test_deterministic_research_summarizes_findings() {
        let orchestrator = orchestrator(
            Arc::new(FixedSearchBackend),
            Arc::new(FixedGenerator("Condensed research summary")),
        );

        let context = orchestrator.gather(&TripRequest::new("Paris", 3)).await;
        assert_eq!(context, "Condensed research summary");
    }

    #[tokio::test]
    async fn test_failed_summary_falls_back_to_raw_findings() {
        let orchestrator = orchestrator(Arc::new(FixedSearchBackend), Arc::new(BrokenGenerator));

        let context = orchestrator.gather(&TripRequest::new("Paris", 3)).await;
        assert!(context.contains("Search Results:"));
        assert!(context.contains("Top Attractions:"));
        assert!(context.contains("Weather:"));
        assert!(context.contains("Cultural Tips:"));
        assert!(context.contains("Coordinates will be automatically fetched"));
    }

    #[tokio::test]
    async fn test_broken_tools_leave_inline_error_notes() {
        let orchestrator = orchestrator(Arc::new(BrokenSearchBackend), Arc::new(BrokenGenerator));

        let context = orchestrator.gather(&TripRequest::new("Paris", 3)).await;
        // 工具失败不会中断调研，失败以内联诊断出现
        assert!(context.contains("Tool error:"));
        assert!(context.contains("Search Results:"));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let text = "巴黎是一座适合漫步的城市";
        let truncated = truncate_chars(text, 4);
        assert_eq!(truncated, "巴黎是一");
    }

    #[test]
    fn test_truncate_chars_leaves_short_text_alone() {
        assert_eq!(truncate_chars("short", 800), "short");
    }
}
