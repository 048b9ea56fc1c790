//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::llm::tools::Toolkit;

mod providers;
mod react;
mod react_executor;
mod summary_reasoner;

pub use react::{ReActConfig, ReActResponse};

use providers::ProviderClient;
use react_executor::ReActExecutor;
use summary_reasoner::SummaryReasoner;

/// 生成调用的注入缝隙 - 管线通过该trait与具体模型服务解耦，测试注入固定输出
#[async_trait]
pub trait Generator: Send + Sync {
    /// 给定完整提示词，返回模型的自由文本输出
    async fn complete(&self, prompt: &str) -> Result<String>;
}

const PLANNER_PREAMBLE: &str = "You are an expert travel planner AI assistant.";

/// LLM客户端
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    ///
    /// 凭证缺失意味着部署不可用，在构造时立即失败，不要等到首个请求。
    pub fn new(config: Config) -> Result<Self> {
        let mut config = config;
        let api_key = config.llm.resolve_api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "Missing API key for provider {}. Set llm.api_key in tripforge.toml or the TRIPFORGE_API_KEY environment variable.",
                config.llm.provider
            )
        })?;
        config.llm.api_key = api_key;

        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self.prompt_once("Hello").await {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 简化的单轮对话方法（不使用工具）
    ///
    /// 客户端自身不做重试，重试策略由工作流层持有。
    pub async fn prompt_once(&self, prompt: &str) -> Result<String> {
        let agent =
            self.client
                .create_agent(&self.config.llm.model, PLANNER_PREAMBLE, &self.config.llm);
        agent.prompt(prompt).await
    }

    /// 使用ReAct模式进行多轮调研
    pub async fn prompt_with_react(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        toolkit: &Toolkit,
        react_config: ReActConfig,
    ) -> Result<ReActResponse> {
        let agent = self.client.create_agent_with_tools(
            &self.config.llm.model,
            system_prompt,
            &self.config.llm,
            toolkit,
        );

        let response = ReActExecutor::execute(&agent, user_prompt, &react_config).await?;

        // 如果达到最大迭代次数且启用了总结推理，则尝试fallover
        if response.stopped_by_max_depth
            && react_config.enable_summary_reasoning
            && response.chat_history.is_some()
        {
            if react_config.verbose {
                println!("🔄 启动ReAct Agent总结转直接推理模式...");
            }

            match self
                .try_summary_reasoning(system_prompt, user_prompt, &response)
                .await
            {
                Ok(summary_response) => {
                    if react_config.verbose {
                        println!("✅ 总结推理完成");
                    }
                    return Ok(summary_response);
                }
                Err(e) => {
                    if react_config.verbose {
                        println!("⚠️  总结推理失败，返回原始部分结果...{}", e);
                    }
                    // 总结推理失败时，返回原始的部分结果
                }
            }
        }

        Ok(response)
    }

    /// 尝试总结推理fallover
    async fn try_summary_reasoning(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        original_response: &ReActResponse,
    ) -> Result<ReActResponse> {
        let agent_without_tools =
            self.client
                .create_agent(&self.config.llm.model, system_prompt, &self.config.llm);

        let chat_history = original_response
            .chat_history
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("缺少对话历史"))?;

        let summary_result = SummaryReasoner::summarize_and_reason(
            &agent_without_tools,
            system_prompt,
            user_prompt,
            chat_history,
            &original_response.tool_calls_history,
        )
        .await?;

        Ok(ReActResponse::from_summary_reasoning(
            summary_result,
            original_response.iterations_used,
            original_response.tool_calls_history.clone(),
            chat_history.clone(),
        ))
    }
}

#[async_trait]
impl Generator for LLMClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompt_once(prompt).await
    }
}
