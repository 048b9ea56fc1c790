use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use tripforge_rs::config::Config;
use tripforge_rs::generator::outlet;
use tripforge_rs::generator::workflow::ItineraryService;
use tripforge_rs::llm::client::Generator;
use tripforge_rs::llm::tools::backends::{GeocodeBackend, SearchBackend, SearchHit};
use tripforge_rs::llm::tools::Toolkit;
use tripforge_rs::types::TripRequest;

/// 固定返回文本的搜索后端
struct StubSearchBackend;

#[async_trait]
impl SearchBackend for StubSearchBackend {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: format!("Guide: {}", query),
            snippet: "The Louvre is rated 4.7 and best visited early".to_string(),
            url: "https://example.com/guide".to_string(),
        }])
    }
}

/// 内部抛错的搜索后端，模拟工具在适配层内部失败
struct ThrowingSearchBackend;

#[async_trait]
impl SearchBackend for ThrowingSearchBackend {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Err(anyhow!("search provider exploded"))
    }
}

struct StubGeocodeBackend;

#[async_trait]
impl GeocodeBackend for StubGeocodeBackend {
    async fn lookup(&self, _query: &str) -> Result<Option<(f64, f64)>> {
        Ok(Some((48.8566, 2.3522)))
    }
}

/// 按脚本依次返回结果并记录提示词的fake生成器
struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("script exhausted")))
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.geocode.delay_ms = 0;
    config.llm.retry_delay_ms = 0;
    config
}

fn service_with(
    search_backend: Arc<dyn SearchBackend>,
    generator: Arc<ScriptedGenerator>,
    config: &Config,
) -> ItineraryService {
    let toolkit = Toolkit::new(search_backend, Arc::new(StubGeocodeBackend));
    ItineraryService::with_components(generator, toolkit, config)
}

/// 构造一份3天的合法报告JSON，其中一个评分给成0-10标尺的9.0
fn three_day_report_json() -> String {
    r#"{
        "summary": "Three easy days in Paris",
        "destination": "Paris",
        "total_days": 3,
        "day_plans": [
            {
                "day_number": 1,
                "title": "Museums",
                "activities": [{
                    "name": "Louvre",
                    "location": {"name": "Louvre Museum", "rating": 9.0}
                }]
            },
            {
                "day_number": 2,
                "title": "Riverside",
                "activities": [{
                    "name": "Seine walk",
                    "location": {"name": "Pont Neuf", "rating": 4.4}
                }]
            },
            {
                "day_number": 3,
                "title": "Montmartre",
                "activities": [{
                    "name": "Sacré-Cœur",
                    "location": {"name": "Sacré-Cœur", "rating": 4.8}
                }]
            }
        ]
    }"#
    .to_string()
}

/// 场景1：工具固定返回、生成器给出合法3天JSON且带9.0评分
#[tokio::test]
async fn test_scenario_three_day_paris_with_scale_normalization() {
    let config = test_config();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        // 第一次调用：确定性调研模式的总结
        Ok("Research summary: museums, riverside walks, Montmartre".to_string()),
        // 第二次调用：正式生成
        Ok(format!("```json\n{}\n```", three_day_report_json())),
    ]));
    let service = service_with(Arc::new(StubSearchBackend), generator, &config);

    let mut request = TripRequest::new("Paris", 3);
    request.difficulty_level = Some("easy".to_string());

    let outcome = service.generate(&request).await;

    assert!(outcome.success, "unexpected failure: {}", outcome.message);
    let report = outcome.itinerary.unwrap();
    assert_eq!(report.day_plans.len(), 3);
    assert_eq!(
        report.day_plans[0].activities[0].location.rating,
        Some(4.5),
        "a 9.0 rating must be normalized onto the 0-5 scale"
    );
    // 天数序列连续
    let day_numbers: Vec<u32> = report.day_plans.iter().map(|plan| plan.day_number).collect();
    assert_eq!(day_numbers, vec![1, 2, 3]);
}

/// 场景2：生成器输出不含任何JSON对象
#[tokio::test]
async fn test_scenario_free_text_without_json_fails_with_parse_message() {
    let config = test_config();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("research".to_string()),
        Ok("I'm sorry, I can only describe Paris in prose today.".to_string()),
    ]));
    let service = service_with(Arc::new(StubSearchBackend), generator, &config);

    let outcome = service.generate(&TripRequest::new("Paris", 3)).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("Failed to parse JSON"));
    assert!(outcome.processing_time >= 0.0);
}

/// 场景3：工具在内部抛错，管线仍然成功完成，调研上下文带有工具错误占位
#[tokio::test]
async fn test_scenario_tool_failure_degrades_without_aborting() {
    let config = test_config();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        // 调研总结失败，迫使编排器把原始工具结果（含Tool error占位）向前传递
        Err(anyhow!("summary model unavailable")),
        Ok(three_day_report_json()),
    ]));
    let service = service_with(Arc::new(ThrowingSearchBackend), generator.clone(), &config);

    let outcome = service.generate(&TripRequest::new("Paris", 3)).await;

    assert!(outcome.success, "tool failures must not abort: {}", outcome.message);

    let prompts = generator.recorded_prompts();
    let generation_prompt = prompts.last().unwrap();
    assert!(
        generation_prompt.contains("Tool error:"),
        "research context should carry inline tool-error notes"
    );
}

/// 场景4：请求5天但模型只产出2天
#[tokio::test]
async fn test_scenario_day_count_mismatch_is_rejected() {
    let config = test_config();
    let two_day_json = r#"{
        "summary": "Two days only",
        "destination": "Paris",
        "total_days": 2,
        "day_plans": [
            {"day_number": 1, "title": "Day 1", "activities": [{
                "name": "Walk", "location": {"name": "Somewhere"}
            }]},
            {"day_number": 2, "title": "Day 2", "activities": []}
        ]
    }"#;
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("research".to_string()),
        Ok(two_day_json.to_string()),
    ]));
    let service = service_with(Arc::new(StubSearchBackend), generator, &config);

    let outcome = service.generate(&TripRequest::new("Paris", 5)).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("Failed to validate itinerary"));
    assert!(outcome.processing_time >= 0.0);
}

/// 成功结果落盘后可以从输出目录读回
#[tokio::test]
async fn test_outcome_round_trips_through_outlet() {
    let config = test_config();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("research".to_string()),
        Ok(three_day_report_json()),
    ]));
    let service = service_with(Arc::new(StubSearchBackend), generator, &config);

    let outcome = service.generate(&TripRequest::new("Paris", 3)).await;
    assert!(outcome.success);

    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("out");
    outlet::save(&outcome, &output_path).unwrap();

    let json = std::fs::read_to_string(output_path.join("itinerary.json")).unwrap();
    assert!(json.contains("\"destination\": \"Paris\""));

    let markdown = std::fs::read_to_string(output_path.join("itinerary.md")).unwrap();
    assert!(markdown.starts_with("# Paris Travel Itinerary"));
}

/// 凭证缺失是初始化阶段的致命配置错误，不会被包装成失败结果
#[test]
fn test_missing_credential_fails_initialization_eagerly() {
    let mut config = test_config();
    config.llm.provider = "mistral".parse().unwrap();
    config.llm.api_key = String::new();

    // 环境里可能配置了真实凭证，只有确实解析不到时才断言报错
    if config.llm.resolve_api_key().is_none() {
        let result = ItineraryService::initialize(&config);
        assert!(result.is_err());
        let message = format!("{}", result.err().unwrap());
        assert!(message.contains("Missing API key"));
    }
}

/// 坐标补全把缺失的坐标成对回填
#[tokio::test]
async fn test_enrichment_backfills_coordinates_in_pairs() {
    let config = test_config();
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("research".to_string()),
        Ok(three_day_report_json()),
    ]));
    let service = service_with(Arc::new(StubSearchBackend), generator, &config);

    let outcome = service.generate(&TripRequest::new("Paris", 3)).await;
    let report = outcome.itinerary.unwrap();

    for day_plan in &report.day_plans {
        for activity in &day_plan.activities {
            assert_eq!(activity.location.latitude, Some(48.8566));
            assert_eq!(activity.location.longitude, Some(2.3522));
        }
    }
}
