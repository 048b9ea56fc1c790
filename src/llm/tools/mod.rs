//! 行程调研工具集 - 封闭枚举的五种工具能力
//!
//! 每个工具都同时暴露两种调用面：供编排器直接调用的`run`方法（永不
//! 向外抛错，失败转化为降级文本），以及挂载到推理循环Agent上的
//! `rig::tool::Tool`实现。

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;

pub mod backends;
mod customs;
mod geocode;
mod rank;
mod search;
mod weather;

pub use backends::{
    DuckDuckGoBackend, GeocodeBackend, NominatimBackend, SearchBackend, SearchHit,
};
pub use customs::AgentToolLocalCustoms;
pub use geocode::AgentToolGeocode;
pub use rank::AgentToolAttractionRank;
pub use search::AgentToolWebSearch;
pub use weather::AgentToolWeather;

/// 工具能力枚举
///
/// 工具集合是封闭的：编排器的固定工具序列可以静态检查，
/// 不存在按名称动态查表的调用路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
    Rank,
    Weather,
    Customs,
    Geocode,
}

impl ToolKind {
    pub const fn name(&self) -> &'static str {
        match self {
            ToolKind::Search => "search_travel_information",
            ToolKind::Rank => "rank_attractions_by_category",
            ToolKind::Weather => "get_weather_info",
            ToolKind::Customs => "get_local_customs_tips",
            ToolKind::Geocode => "get_place_coordinates",
        }
    }
}

/// 工具调用结果
///
/// 适配层的失败被就地转化为带`Tool error:`前缀的诊断文本，
/// 调用方通过显式分支决定如何降级，而不是捕获异常。
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// 正常的格式化文本输出
    Success(String),
    /// 降级输出，携带诊断信息
    Degraded(String),
}

impl ToolOutcome {
    /// 以统一前缀构造降级结果，便于调用方按前缀识别
    pub fn degraded(reason: impl std::fmt::Display) -> Self {
        ToolOutcome::Degraded(format!("Tool error: {}", reason))
    }

    pub fn text(&self) -> &str {
        match self {
            ToolOutcome::Success(text) => text,
            ToolOutcome::Degraded(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ToolOutcome::Success(text) => text,
            ToolOutcome::Degraded(text) => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ToolOutcome::Degraded(_))
    }
}

/// 行程调研工具集 - 持有全部五种工具，供编排器与Agent共用
#[derive(Clone)]
pub struct Toolkit {
    pub search: AgentToolWebSearch,
    pub rank: AgentToolAttractionRank,
    pub weather: AgentToolWeather,
    pub customs: AgentToolLocalCustoms,
    pub geocode: AgentToolGeocode,
}

impl Toolkit {
    /// 基于注入的后端构造工具集（测试时传入fake后端）
    pub fn new(
        search_backend: Arc<dyn SearchBackend>,
        geocode_backend: Arc<dyn GeocodeBackend>,
    ) -> Self {
        Self {
            search: AgentToolWebSearch::new(search_backend.clone()),
            rank: AgentToolAttractionRank::new(search_backend.clone()),
            weather: AgentToolWeather::new(search_backend.clone()),
            customs: AgentToolLocalCustoms::new(search_backend),
            geocode: AgentToolGeocode::new(geocode_backend),
        }
    }

    /// 基于配置构造真实后端的工具集
    pub fn from_config(config: &Config) -> Result<Self> {
        let search_backend: Arc<dyn SearchBackend> = Arc::new(DuckDuckGoBackend::new()?);
        let geocode_backend: Arc<dyn GeocodeBackend> =
            Arc::new(NominatimBackend::new(&config.geocode)?);
        Ok(Self::new(search_backend, geocode_backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_outcome_degraded_prefix() {
        let outcome = ToolOutcome::degraded("connection refused");
        assert!(outcome.is_degraded());
        assert!(outcome.text().starts_with("Tool error:"));
        assert!(outcome.text().contains("connection refused"));
    }

    #[test]
    fn test_tool_outcome_success_text() {
        let outcome = ToolOutcome::Success("Title: A\n".to_string());
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.into_text(), "Title: A\n");
    }

    #[test]
    fn test_tool_kind_names_are_stable() {
        assert_eq!(ToolKind::Search.name(), "search_travel_information");
        assert_eq!(ToolKind::Rank.name(), "rank_attractions_by_category");
        assert_eq!(ToolKind::Weather.name(), "get_weather_info");
        assert_eq!(ToolKind::Customs.name(), "get_local_customs_tips");
        assert_eq!(ToolKind::Geocode.name(), "get_place_coordinates");
    }
}
