//! 行程报告数据模型 - 管线的严格校验输出结构

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 地点信息
///
/// latitude与longitude在最终报告中要么同时存在、要么同时缺失，
/// 坐标补全过程保证不会只写入其中一个。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// 地点名称
    pub name: String,
    /// 地址
    pub address: Option<String>,
    /// 纬度
    pub latitude: Option<f64>,
    /// 经度
    pub longitude: Option<f64>,
    /// 平均评分（0-5）
    pub rating: Option<f64>,
    /// 评论数量
    pub review_count: Option<u32>,
    /// 地点类别
    pub category: Option<String>,
    /// 地点配图URL（来源于搜索结果）
    pub image_url: Option<String>,
    /// 配图替代文本
    pub image_alt: Option<String>,
}

impl Location {
    /// 两个坐标是否都缺失（坐标补全的触发条件）
    pub fn missing_coordinates(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none()
    }
}

/// 活动信息
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    /// 活动名称
    pub name: String,
    /// 活动详细描述
    pub description: Option<String>,
    /// 活动地点
    pub location: Location,
    /// 开始时间（HH:MM）
    pub start_time: Option<String>,
    /// 结束时间（HH:MM）
    pub end_time: Option<String>,
    /// 持续小时数
    pub duration_hours: Option<f64>,
    /// 费用估算
    pub cost_estimate: Option<String>,
    /// 建议与提示
    pub tips: Option<Vec<String>>,
    /// 优先级（1-5）
    pub priority: Option<u32>,
    /// 活动配图URL
    pub image_url: Option<String>,
    /// 预订信息或网址
    pub booking_info: Option<String>,
}

/// 单日行程计划
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// 第几天
    pub day_number: u32,
    /// 当日日期（字符串格式）
    pub date: Option<String>,
    /// 当日标题或主题
    pub title: String,
    /// 当日概述
    pub description: Option<String>,
    /// 当日主题
    pub theme: Option<String>,
    /// 当日活动列表
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// 当日费用估算
    pub estimated_cost: Option<String>,
    /// 当日备注
    pub notes: Option<String>,
    /// 当日亮点
    pub highlights: Option<Vec<String>>,
}

/// 住宿推荐
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Accommodation {
    /// 住宿名称
    pub name: String,
    /// 类型（hotel、hostel、Airbnb等）
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// 所在区域
    pub location: Option<String>,
    /// 完整地址
    pub address: Option<String>,
    /// 每晚价格区间
    pub price_range: Option<String>,
    /// 评分（0-5）
    pub rating: Option<f64>,
    /// 评论数量
    pub review_count: Option<u32>,
    /// 推荐理由
    pub recommendation_reason: Option<String>,
    /// 配图URL
    pub image_url: Option<String>,
    /// 设施列表
    pub amenities: Option<Vec<String>>,
    /// 预订网址
    pub booking_url: Option<String>,
}

/// 交通信息
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Transportation {
    /// 交通方式
    #[serde(rename = "type")]
    pub kind: String,
    /// 路线描述
    pub route: Option<String>,
    /// 费用估算
    pub estimated_cost: Option<String>,
    /// 耗时估算
    pub duration: Option<String>,
    /// 交通建议
    pub tips: Option<Vec<String>>,
}

/// 完整行程报告 - 严格校验的根实体
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryReport {
    /// 行程总体概述
    pub summary: String,
    /// 目的地名称
    pub destination: String,
    /// 总天数，必须与请求的duration一致
    pub total_days: u32,
    /// 行程类型
    pub travel_type: Option<String>,
    /// 总预算估算
    pub budget_estimate: Option<String>,

    /// 逐日行程计划，day_number必须构成1..total_days的连续序列
    #[serde(default)]
    pub day_plans: Vec<DayPlan>,

    /// 排名靠前的景点
    pub top_attractions: Option<Vec<Location>>,
    /// 必去地点
    pub must_visit_places: Option<Vec<Location>>,

    /// 住宿推荐
    pub accommodation_recommendations: Option<Vec<Accommodation>>,

    /// 交通建议
    pub transportation_tips: Option<Vec<Transportation>>,
    /// 本地交通说明
    pub local_transport: Option<String>,

    /// 通用旅行建议
    pub general_tips: Option<Vec<String>>,
    /// 文化习俗提示
    pub cultural_notes: Option<Vec<String>>,
    /// 最佳旅行时间
    pub best_time_to_visit: Option<String>,
    /// 天气信息
    pub weather_info: Option<String>,

    /// 目的地主图URL
    pub destination_image: Option<String>,
    /// 行程封面图URL
    pub cover_image: Option<String>,

    /// 报告生成时间
    pub created_at: Option<String>,
    /// 最近更新时间
    pub last_updated: Option<String>,

    /// 供前端渲染的markdown描述，校验通过后由管线生成
    pub markdown_description: Option<String>,
}

impl ItineraryReport {
    /// 遍历报告中所有携带坐标的地点（活动地点、热门景点、必去地点）
    pub fn locations_mut(&mut self) -> Vec<&mut Location> {
        let mut locations = Vec::new();
        for day_plan in &mut self.day_plans {
            for activity in &mut day_plan.activities {
                locations.push(&mut activity.location);
            }
        }
        if let Some(attractions) = &mut self.top_attractions {
            locations.extend(attractions.iter_mut());
        }
        if let Some(places) = &mut self.must_visit_places {
            locations.extend(places.iter_mut());
        }
        locations
    }
}

/// 行程生成结果 - 面向调用方的最终返回结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryOutcome {
    /// 是否生成成功
    pub success: bool,
    /// 生成的行程报告
    pub itinerary: Option<ItineraryReport>,
    /// 状态消息
    pub message: String,
    /// 处理耗时（秒），无论成败都会记录
    pub processing_time: f64,
}

impl ItineraryOutcome {
    pub fn success(itinerary: ItineraryReport, processing_time: f64) -> Self {
        Self {
            success: true,
            itinerary: Some(itinerary),
            message: "Itinerary generated successfully".to_string(),
            processing_time,
        }
    }

    pub fn failure(message: impl Into<String>, processing_time: f64) -> Self {
        Self {
            success: false,
            itinerary: None,
            message: message.into(),
            processing_time,
        }
    }
}
