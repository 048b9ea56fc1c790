use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 各Provider约定俗成的API KEY环境变量名
    fn conventional_env_key(&self) -> Option<&'static str> {
        match self {
            LLMProvider::OpenAI => Some("OPENAI_API_KEY"),
            LLMProvider::Moonshot => Some("MOONSHOT_API_KEY"),
            LLMProvider::DeepSeek => Some("DEEPSEEK_API_KEY"),
            LLMProvider::Mistral => Some("MISTRAL_API_KEY"),
            LLMProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
            LLMProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LLMProvider::Gemini => Some("GOOGLE_API_KEY"),
            // 本地推理不需要凭证
            LLMProvider::Ollama => None,
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 输出路径
    pub output_path: PathBuf,

    /// 启动时跳过模型连接检查
    pub skip_preflight: bool,

    /// 跳过目的地调研阶段（生成时不携带调研上下文）
    pub skip_research: bool,

    /// 是否启用详细日志
    pub verbose: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 调研Agent配置
    pub agent: AgentConfig,

    /// 地理编码配置
    pub geocode: GeocodeConfig,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 生成模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度（行程文案需要创造性但保持结构，取中间值）
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

impl LLMConfig {
    /// 解析生成凭证：配置值 > TRIPFORGE_API_KEY > Provider约定变量
    ///
    /// 返回None表示部署不可用，调用方应立即报配置错误而不是降级。
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.clone());
        }
        if let Ok(key) = std::env::var("TRIPFORGE_API_KEY")
            && !key.trim().is_empty()
        {
            return Some(key);
        }
        if let Some(env_key) = self.provider.conventional_env_key()
            && let Ok(key) = std::env::var(env_key)
            && !key.trim().is_empty()
        {
            return Some(key);
        }
        // Ollama无需凭证，返回占位值保持调用方逻辑一致
        if self.provider == LLMProvider::Ollama {
            return Some(String::new());
        }
        None
    }
}

/// 调研Agent配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// 推理循环最大迭代次数
    pub max_iterations: usize,

    /// 推理循环最大执行时间（秒）
    pub max_execution_seconds: u64,

    /// 禁用推理循环，强制使用确定性工具序列
    pub disable_react: bool,
}

/// 地理编码配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeocodeConfig {
    /// 地理编码服务基地址
    pub endpoint: String,

    /// 相邻两次查询之间的间隔（毫秒），对第三方服务的限速礼让
    pub delay_ms: u64,

    /// 单次查询超时（秒）
    pub timeout_seconds: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./tripforge.out"),
            skip_preflight: false,
            skip_research: false,
            verbose: false,
            llm: LLMConfig::default(),
            agent: AgentConfig::default(),
            geocode: GeocodeConfig::default(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::from("https://generativelanguage.googleapis.com"),
            model: String::from("gemini-2.5-flash"),
            max_tokens: 65536,
            temperature: 0.7,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 300,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_execution_seconds: 300,
            disable_react: false,
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("https://nominatim.openstreetmap.org"),
            delay_ms: 500,
            timeout_seconds: 10,
        }
    }
}
