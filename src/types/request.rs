//! 行程规划请求模型

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

fn default_group_size() -> u32 {
    1
}

/// 行程规划请求 - 已识别字段 + 显式的未识别字段侧通道
///
/// 前端传入的多余字段不会导致请求被拒绝，而是原样收进`extra`，
/// 生成管线不读取它们。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    /// 目的地（城市、国家或任意描述文本）
    pub destination: String,

    /// 行程天数
    pub duration: u32,

    /// 出发日期（任意格式的字符串）
    pub start_date: Option<String>,

    /// 难度等级（easy / moderate / challenging 等任意文本）
    pub difficulty_level: Option<String>,

    /// 预算范围
    pub budget_range: Option<String>,

    /// 兴趣偏好
    pub interests: Option<String>,

    /// 同行人数
    #[serde(default = "default_group_size")]
    pub group_size: u32,

    /// 住宿类型偏好
    pub accommodation_type: Option<String>,

    /// 补充说明
    pub notes: Option<String>,

    /// 未识别的额外字段，接受但不参与校验
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TripRequest {
    /// 构造一个只带必填字段的请求
    pub fn new(destination: impl Into<String>, duration: u32) -> Self {
        Self {
            destination: destination.into(),
            duration,
            start_date: None,
            difficulty_level: None,
            budget_range: None,
            interests: None,
            group_size: 1,
            accommodation_type: None,
            notes: None,
            extra: HashMap::new(),
        }
    }

    pub fn difficulty_or_default(&self) -> &str {
        self.difficulty_level.as_deref().unwrap_or("moderate")
    }

    pub fn budget_or_default(&self) -> &str {
        self.budget_range.as_deref().unwrap_or("moderate")
    }

    pub fn interests_or_default(&self) -> &str {
        self.interests.as_deref().unwrap_or("general sightseeing")
    }

    pub fn accommodation_or_default(&self) -> &str {
        self.accommodation_type.as_deref().unwrap_or("mixed")
    }

    pub fn start_date_or_default(&self) -> &str {
        self.start_date.as_deref().unwrap_or("not specified")
    }
}
