//! 行程生成工作流 - 顶层门面、阶段状态机与耗时统计

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::Config;
use crate::generator::enrich::CoordinateEnricher;
use crate::generator::outlet;
use crate::generator::parser::ItineraryParser;
use crate::generator::prompts;
use crate::generator::research::ResearchOrchestrator;
use crate::llm::client::{Generator, LLMClient};
use crate::llm::tools::Toolkit;
use crate::types::{ItineraryOutcome, ItineraryReport, TripRequest};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Option<Instant>,
    phase_start_times: HashMap<String, Instant>,
    phase_durations: HashMap<String, Duration>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            phase_start_times: HashMap::new(),
            phase_durations: HashMap::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        if let Some(start_time) = self.phase_start_times.remove(phase_name) {
            let duration = start_time.elapsed();
            self.phase_durations
                .insert(phase_name.to_string(), duration);
            Some(duration)
        } else {
            None
        }
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = String::new();

        if let Some(total_duration) = self.get_total_duration() {
            report.push_str(&format!(
                "总执行时间: {:.2}秒\n",
                total_duration.as_secs_f64()
            ));
        }

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const RESEARCH: &'static str = "research";
    pub const GENERATION: &'static str = "generation";
    pub const PARSING: &'static str = "parsing";
    pub const ENRICHMENT: &'static str = "enrichment";
    pub const RENDER: &'static str = "render";
}

/// 单次请求的管线阶段状态机
///
/// 成功路径：Idle → ResearchInProgress → GenerationInProgress → Parsing
/// → Enriching → Finalized；任一阶段出错则进入Failed。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    ResearchInProgress,
    GenerationInProgress,
    Parsing,
    Enriching,
    Finalized,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::ResearchInProgress => "ResearchInProgress",
            PipelineStage::GenerationInProgress => "GenerationInProgress",
            PipelineStage::Parsing => "Parsing",
            PipelineStage::Enriching => "Enriching",
            PipelineStage::Finalized => "Finalized",
            PipelineStage::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

/// 行程生成服务
///
/// 两段式生命周期：`initialize`在进程启动时调用一次，产出不可变、可
/// 跨请求共享的服务实例；`generate`只读共享状态，可被并发调用。
pub struct ItineraryService {
    llm_client: Option<LLMClient>,
    orchestrator: ResearchOrchestrator,
    parser: ItineraryParser,
    generator: Arc<dyn Generator>,
    enricher: CoordinateEnricher,
    retry_attempts: u32,
    retry_delay_ms: u64,
    skip_research: bool,
    verbose: bool,
}

impl ItineraryService {
    /// 初始化服务（进程启动时调用一次）
    ///
    /// 生成凭证缺失在这里立即失败——这是致命的部署配置错误，
    /// 不会被包装成失败的生成结果。
    pub fn initialize(config: &Config) -> Result<Self> {
        let llm_client = LLMClient::new(config.clone())?;
        let toolkit = Toolkit::from_config(config)?;
        let generator: Arc<dyn Generator> = Arc::new(llm_client.clone());

        let react_client = if config.agent.disable_react {
            None
        } else {
            Some(llm_client.clone())
        };

        let orchestrator = ResearchOrchestrator::new(
            react_client,
            generator.clone(),
            toolkit.clone(),
            config.agent.clone(),
            config.verbose,
        );
        let enricher = CoordinateEnricher::new(
            toolkit.geocode.clone(),
            Duration::from_millis(config.geocode.delay_ms),
        );

        Ok(Self {
            llm_client: Some(llm_client),
            orchestrator,
            parser: ItineraryParser::new(),
            generator,
            enricher,
            retry_attempts: config.llm.retry_attempts,
            retry_delay_ms: config.llm.retry_delay_ms,
            skip_research: config.skip_research,
            verbose: config.verbose,
        })
    }

    /// 以注入的组件组装服务（测试或嵌入场景），不使用ReAct模式
    pub fn with_components(
        generator: Arc<dyn Generator>,
        toolkit: Toolkit,
        config: &Config,
    ) -> Self {
        let orchestrator = ResearchOrchestrator::new(
            None,
            generator.clone(),
            toolkit.clone(),
            config.agent.clone(),
            config.verbose,
        );
        let enricher = CoordinateEnricher::new(
            toolkit.geocode.clone(),
            Duration::from_millis(config.geocode.delay_ms),
        );

        Self {
            llm_client: None,
            orchestrator,
            parser: ItineraryParser::new(),
            generator,
            enricher,
            retry_attempts: config.llm.retry_attempts,
            retry_delay_ms: config.llm.retry_delay_ms,
            skip_research: config.skip_research,
            verbose: config.verbose,
        }
    }

    /// 检查模型连接
    pub async fn check_connection(&self) -> Result<()> {
        match &self.llm_client {
            Some(client) => client.check_connection().await,
            None => Ok(()),
        }
    }

    /// 处理一次行程生成请求
    ///
    /// 任何阶段失败都被转化为`success=false`的结果返回，耗时总会被
    /// 记录；异常永远不会穿透到调用方。
    pub async fn generate(&self, request: &TripRequest) -> ItineraryOutcome {
        let started = Instant::now();
        let mut timing = TimingScope::new();

        match self.run_pipeline(request, &mut timing).await {
            Ok(report) => {
                if self.verbose {
                    println!("\n{}", timing.generate_timing_report());
                }
                ItineraryOutcome::success(report, round_seconds(started.elapsed()))
            }
            Err(e) => {
                self.enter_stage(PipelineStage::Failed);
                eprintln!("❌ 行程生成失败: {}", e);
                ItineraryOutcome::failure(
                    format!("Error generating itinerary: {}", e),
                    round_seconds(started.elapsed()),
                )
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &TripRequest,
        timing: &mut TimingScope,
    ) -> Result<ItineraryReport> {
        // 调研阶段
        self.enter_stage(PipelineStage::ResearchInProgress);
        timing.start_phase(TimingKeys::RESEARCH);
        let research_context = if self.skip_research {
            "(destination research skipped by configuration)".to_string()
        } else {
            self.orchestrator.gather(request).await
        };
        timing.end_phase(TimingKeys::RESEARCH);

        // 生成阶段（生成调用由工作流持有重试策略）
        self.enter_stage(PipelineStage::GenerationInProgress);
        timing.start_phase(TimingKeys::GENERATION);
        let prompt = prompts::generation_prompt(
            request,
            &research_context,
            self.parser.format_instructions(),
        );
        let raw_output = self
            .retry_with_backoff(|| self.generator.complete(&prompt))
            .await?;
        timing.end_phase(TimingKeys::GENERATION);

        // 解析与归一化阶段
        self.enter_stage(PipelineStage::Parsing);
        timing.start_phase(TimingKeys::PARSING);
        let mut report = self.parser.parse(&raw_output, request.duration)?;
        timing.end_phase(TimingKeys::PARSING);

        // 坐标补全阶段（尽力而为，不会失败）
        self.enter_stage(PipelineStage::Enriching);
        timing.start_phase(TimingKeys::ENRICHMENT);
        let filled = self.enricher.enrich(&mut report, &request.destination).await;
        timing.end_phase(TimingKeys::ENRICHMENT);
        if self.verbose {
            println!("📍 坐标补全完成，新增{}处坐标", filled);
        }

        // 定稿：markdown与时间戳只在校验通过后生成
        timing.start_phase(TimingKeys::RENDER);
        report.markdown_description = Some(outlet::render_markdown(&report));
        report.created_at = Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        timing.end_phase(TimingKeys::RENDER);

        self.enter_stage(PipelineStage::Finalized);
        Ok(report)
    }

    fn enter_stage(&self, stage: PipelineStage) {
        if self.verbose {
            println!("▶️ 进入阶段: {}", stage);
        }
    }

    /// 通用重试逻辑，用于处理生成调用的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_retries = self.retry_attempts;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    eprintln!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries, max_retries, err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
                }
            }
        }
    }
}

/// 耗时取两位小数（秒）
fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// 启动行程生成工作流：初始化服务、生成行程并落盘
pub async fn launch(config: &Config, request: &TripRequest) -> Result<ItineraryOutcome> {
    let service = ItineraryService::initialize(config)?;

    // 启动时检查模型连接
    if !config.skip_preflight {
        service.check_connection().await?;
    }

    let outcome = service.generate(request).await;
    outlet::save(&outcome, &config.output_path)?;

    Ok(outcome)
}
