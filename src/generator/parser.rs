//! 输出解析与归一化 - 把模型的自由文本强制转化为严格校验的行程报告
//!
//! 解析顺序是固定的：提取JSON → 评分归一化 → 结构校验。归一化必须发生
//! 在校验之前，否则0-10标尺的合法输出会被评分上界直接拒绝。

use serde_json::Value;

use crate::types::ItineraryReport;

/// 解析与校验阶段的错误
///
/// Parse与Validation是两类不同的阶段失败：前者是提取不到JSON对象，
/// 后者是JSON在结构上不满足报告约束。两者都上抛给工作流转化为失败结果。
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to parse JSON from output: {0}")]
    Parse(String),
    #[error("Failed to validate itinerary: {0}")]
    Validation(String),
}

/// 行程报告解析器
pub struct ItineraryParser {
    format_instructions: String,
}

impl Default for ItineraryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ItineraryParser {
    pub fn new() -> Self {
        Self {
            format_instructions: super::prompts::format_instructions(),
        }
    }

    /// 给生成提示词用的格式说明
    pub fn format_instructions(&self) -> &str {
        &self.format_instructions
    }

    /// 解析模型原始输出
    pub fn parse(&self, raw: &str, expected_days: u32) -> Result<ItineraryReport, OutputError> {
        let stripped = strip_code_fences(raw);

        let mut value: Value = match serde_json::from_str(stripped) {
            Ok(value) => value,
            Err(first_error) => {
                // 严格解析失败时，回退到截取首个'{'到最后一个'}'之间的子串
                let Some(embedded) = extract_embedded_object(stripped) else {
                    return Err(OutputError::Parse(first_error.to_string()));
                };
                serde_json::from_str(embedded)
                    .map_err(|e| OutputError::Parse(e.to_string()))?
            }
        };

        if !value.is_object() {
            return Err(OutputError::Parse(
                "output does not contain a JSON object".to_string(),
            ));
        }

        normalize_ratings(&mut value);
        reconcile_coordinates(&mut value);

        let report: ItineraryReport = serde_json::from_value(value)
            .map_err(|e| OutputError::Validation(e.to_string()))?;

        validate(&report, expected_days)?;
        Ok(report)
    }
}

/// 去掉常见的markdown代码围栏
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// 截取首个'{'到最后一个'}'之间的子串
fn extract_embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// 0-10标尺折半到0-5，保留一位小数
fn halve_rating(rating: f64) -> f64 {
    (rating / 2.0 * 10.0).round() / 10.0
}

/// 对单个对象上的rating字段应用折半规则
fn normalize_rating_field(entry: &mut Value) {
    let Some(object) = entry.as_object_mut() else {
        return;
    };
    if let Some(rating) = object.get("rating").and_then(Value::as_f64)
        && rating > 5.0
    {
        object.insert("rating".to_string(), Value::from(halve_rating(rating)));
    }
}

/// 递归走过所有携带rating的位置：活动地点、热门景点、必去地点、住宿推荐
fn normalize_ratings(value: &mut Value) {
    if let Some(day_plans) = value.get_mut("day_plans").and_then(Value::as_array_mut) {
        for day_plan in day_plans {
            if let Some(activities) = day_plan.get_mut("activities").and_then(Value::as_array_mut)
            {
                for activity in activities {
                    if let Some(location) = activity.get_mut("location") {
                        normalize_rating_field(location);
                    }
                }
            }
        }
    }

    for list_key in ["top_attractions", "must_visit_places", "accommodation_recommendations"] {
        if let Some(entries) = value.get_mut(list_key).and_then(Value::as_array_mut) {
            for entry in entries {
                normalize_rating_field(entry);
            }
        }
    }
}

/// 丢弃只出现一半的坐标，保证经纬度要么成对、要么都缺失
fn scrub_half_coordinates(entry: &mut Value) {
    let Some(object) = entry.as_object_mut() else {
        return;
    };
    let has_latitude = object.get("latitude").and_then(Value::as_f64).is_some();
    let has_longitude = object.get("longitude").and_then(Value::as_f64).is_some();
    if has_latitude != has_longitude {
        object.insert("latitude".to_string(), Value::Null);
        object.insert("longitude".to_string(), Value::Null);
    }
}

fn reconcile_coordinates(value: &mut Value) {
    if let Some(day_plans) = value.get_mut("day_plans").and_then(Value::as_array_mut) {
        for day_plan in day_plans {
            if let Some(activities) = day_plan.get_mut("activities").and_then(Value::as_array_mut)
            {
                for activity in activities {
                    if let Some(location) = activity.get_mut("location") {
                        scrub_half_coordinates(location);
                    }
                }
            }
        }
    }

    for list_key in ["top_attractions", "must_visit_places"] {
        if let Some(entries) = value.get_mut(list_key).and_then(Value::as_array_mut) {
            for entry in entries {
                scrub_half_coordinates(entry);
            }
        }
    }
}

/// 结构校验：必填字段、天数一致性、连续的day_number序列、归一化后的评分上界
fn validate(report: &ItineraryReport, expected_days: u32) -> Result<(), OutputError> {
    if report.summary.trim().is_empty() {
        return Err(OutputError::Validation("summary must not be empty".to_string()));
    }
    if report.destination.trim().is_empty() {
        return Err(OutputError::Validation(
            "destination must not be empty".to_string(),
        ));
    }
    if report.total_days < 1 {
        return Err(OutputError::Validation(
            "total_days must be at least 1".to_string(),
        ));
    }
    if report.day_plans.is_empty() {
        return Err(OutputError::Validation(
            "day_plans must not be empty".to_string(),
        ));
    }
    if report.total_days != expected_days {
        return Err(OutputError::Validation(format!(
            "total_days is {} but the request asked for {} days",
            report.total_days, expected_days
        )));
    }
    if report.day_plans.len() as u32 != report.total_days {
        return Err(OutputError::Validation(format!(
            "expected {} day plans, got {}",
            report.total_days,
            report.day_plans.len()
        )));
    }

    let mut day_numbers: Vec<u32> = report.day_plans.iter().map(|plan| plan.day_number).collect();
    day_numbers.sort_unstable();
    let expected_sequence: Vec<u32> = (1..=report.total_days).collect();
    if day_numbers != expected_sequence {
        return Err(OutputError::Validation(format!(
            "day_number values must form the contiguous sequence 1..{}",
            report.total_days
        )));
    }

    if !report
        .day_plans
        .iter()
        .any(|plan| !plan.activities.is_empty())
    {
        return Err(OutputError::Validation(
            "at least one day plan must contain activities".to_string(),
        ));
    }

    for day_plan in &report.day_plans {
        for activity in &day_plan.activities {
            check_rating(activity.location.rating, &activity.location.name)?;
            if let Some(priority) = activity.priority
                && !(1..=5).contains(&priority)
            {
                return Err(OutputError::Validation(format!(
                    "priority {} for activity '{}' is outside 1-5",
                    priority, activity.name
                )));
            }
        }
    }
    for location in report.top_attractions.iter().flatten() {
        check_rating(location.rating, &location.name)?;
    }
    for location in report.must_visit_places.iter().flatten() {
        check_rating(location.rating, &location.name)?;
    }
    for accommodation in report.accommodation_recommendations.iter().flatten() {
        check_rating(accommodation.rating, &accommodation.name)?;
    }

    Ok(())
}

fn check_rating(rating: Option<f64>, name: &str) -> Result<(), OutputError> {
    if let Some(rating) = rating
        && !(0.0..=5.0).contains(&rating)
    {
        return Err(OutputError::Validation(format!(
            "rating {} for '{}' is outside the 0-5 scale",
            rating, name
        )));
    }
    Ok(())
}
