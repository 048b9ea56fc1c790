use crate::config::{Config, LLMProvider};
use crate::types::TripRequest;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// TripForge - 由Rust与AI驱动的行程规划生成引擎
#[derive(Parser, Debug)]
#[command(name = "TripForge (tripforge-rs)")]
#[command(
    about = "AI-powered travel itinerary generation engine. It researches a destination with a tool-augmented agent, generates a structured day-by-day itinerary, backfills coordinates and renders a markdown travel plan."
)]
#[command(version)]
pub struct Args {
    /// 目的地（城市、国家或任意描述文本）
    #[arg(short, long)]
    pub destination: Option<String>,

    /// 行程天数
    #[arg(long, default_value = "3")]
    pub duration: u32,

    /// 出发日期（任意格式）
    #[arg(long)]
    pub start_date: Option<String>,

    /// 难度等级（easy / moderate / challenging）
    #[arg(long)]
    pub difficulty: Option<String>,

    /// 预算范围
    #[arg(long)]
    pub budget: Option<String>,

    /// 兴趣偏好，如"museums, food"
    #[arg(long)]
    pub interests: Option<String>,

    /// 同行人数
    #[arg(long, default_value = "1")]
    pub group_size: u32,

    /// 住宿类型偏好
    #[arg(long)]
    pub accommodation: Option<String>,

    /// 补充说明
    #[arg(long)]
    pub notes: Option<String>,

    /// 从JSON文件读取完整请求（优先于上面的单项参数）
    #[arg(short, long)]
    pub request_file: Option<PathBuf>,

    /// 输出路径
    #[arg(short, long, default_value = "./tripforge.out")]
    pub output_path: PathBuf,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 跳过启动时的模型连接检查
    #[arg(long)]
    pub skip_preflight: bool,

    /// 跳过目的地调研阶段
    #[arg(long)]
    pub skip_research: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 生成模型
    #[arg(long)]
    pub model: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// LLM Provider (openai, moonshot, deepseek, mistral, openrouter, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 禁用ReAct推理循环，强制使用确定性工具序列
    #[arg(long)]
    pub disable_react: bool,

    /// 相邻两次地理编码查询的间隔（毫秒）
    #[arg(long)]
    pub geocode_delay_ms: Option<u64>,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn to_config(&self) -> Config {
        let mut config = if let Some(config_path) = &self.config {
            // 如果显式指定了配置文件路径，从该路径加载
            Config::from_file(config_path).unwrap_or_else(|_| {
                panic!("⚠️ 警告: 无法读取配置文件 {:?}", config_path)
            })
        } else {
            // 如果没有显式指定配置文件，尝试从默认位置加载
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("tripforge.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path).unwrap_or_else(|_| {
                    panic!(
                        "⚠️ 警告: 无法读取默认配置文件 {:?}",
                        default_config_path
                    )
                })
            } else {
                // 默认配置文件不存在，使用默认值
                Config::default()
            }
        };

        // 覆盖配置文件中的设置
        config.output_path = self.output_path.clone();
        if self.skip_preflight {
            config.skip_preflight = true;
        }
        if self.skip_research {
            config.skip_research = true;
        }
        if self.verbose {
            config.verbose = true;
        }
        if self.disable_react {
            config.agent.disable_react = true;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(delay_ms) = self.geocode_delay_ms {
            config.geocode.delay_ms = delay_ms;
        }

        config
    }

    /// 将CLI参数转换为行程请求
    ///
    /// 指定了`--request-file`时从JSON文件读取（未识别字段被保留而不是
    /// 拒绝），否则由单项参数组装。
    pub fn to_request(&self) -> Result<TripRequest> {
        if let Some(request_path) = &self.request_file {
            let content = std::fs::read_to_string(request_path)
                .context(format!("Failed to read request file: {:?}", request_path))?;
            let request: TripRequest = serde_json::from_str(&content)
                .context("Failed to parse request file as a trip request")?;
            return Ok(request);
        }

        let destination = self
            .destination
            .clone()
            .context("A destination is required: pass --destination or --request-file")?;

        let mut request = TripRequest::new(destination, self.duration);
        request.start_date = self.start_date.clone();
        request.difficulty_level = self.difficulty.clone();
        request.budget_range = self.budget.clone();
        request.interests = self.interests.clone();
        request.group_size = self.group_size;
        request.accommodation_type = self.accommodation.clone();
        request.notes = self.notes.clone();
        Ok(request)
    }
}
