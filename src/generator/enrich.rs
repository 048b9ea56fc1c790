//! 坐标补全 - 校验通过后的尽力而为地理编码回填
//!
//! 串行逐点查询，调用之间强制固定间隔，这是对第三方地理编码服务的
//! 限速礼让。单点失败只留下空坐标，绝不影响整体管线。

use std::time::Duration;

use crate::llm::tools::AgentToolGeocode;
use crate::types::ItineraryReport;

/// 坐标补全器
pub struct CoordinateEnricher {
    geocode: AgentToolGeocode,
    delay: Duration,
}

impl CoordinateEnricher {
    pub fn new(geocode: AgentToolGeocode, delay: Duration) -> Self {
        Self { geocode, delay }
    }

    /// 为所有缺失坐标的地点回填经纬度，返回成功回填的数量
    ///
    /// 已有坐标的地点不会被触碰；经纬度总是成对写入。
    pub async fn enrich(&self, report: &mut ItineraryReport, destination: &str) -> usize {
        let mut filled = 0;

        for location in report.locations_mut() {
            if !location.missing_coordinates() {
                continue;
            }

            let query = format!("{}, {}", location.name, destination);
            if let Some((latitude, longitude)) = self.geocode.lookup(&query).await {
                location.latitude = Some(latitude);
                location.longitude = Some(longitude);
                filled += 1;
            }

            tokio::time::sleep(self.delay).await;
        }

        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::backends::GeocodeBackend;
    use crate::types::{Activity, DayPlan, Location};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// 按查询文本给出固定坐标的fake后端
    struct ScriptedBackend {
        answers: HashMap<String, (f64, f64)>,
    }

    #[async_trait]
    impl GeocodeBackend for ScriptedBackend {
        async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>> {
            Ok(self.answers.get(query).copied())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl GeocodeBackend for FailingBackend {
        async fn lookup(&self, _query: &str) -> Result<Option<(f64, f64)>> {
            Err(anyhow!("geocoder unavailable"))
        }
    }

    fn location(name: &str) -> Location {
        Location {
            name: name.to_string(),
            address: None,
            latitude: None,
            longitude: None,
            rating: None,
            review_count: None,
            category: None,
            image_url: None,
            image_alt: None,
        }
    }

    fn report_with_locations(locations: Vec<Location>) -> ItineraryReport {
        let activities: Vec<Activity> = locations
            .into_iter()
            .map(|location| Activity {
                name: format!("Visit {}", location.name),
                description: None,
                location,
                start_time: None,
                end_time: None,
                duration_hours: None,
                cost_estimate: None,
                tips: None,
                priority: None,
                image_url: None,
                booking_info: None,
            })
            .collect();

        ItineraryReport {
            summary: "trip".to_string(),
            destination: "Paris".to_string(),
            total_days: 1,
            travel_type: None,
            budget_estimate: None,
            day_plans: vec![DayPlan {
                day_number: 1,
                date: None,
                title: "Day 1".to_string(),
                description: None,
                theme: None,
                activities,
                estimated_cost: None,
                notes: None,
                highlights: None,
            }],
            top_attractions: None,
            must_visit_places: None,
            accommodation_recommendations: None,
            transportation_tips: None,
            local_transport: None,
            general_tips: None,
            cultural_notes: None,
            best_time_to_visit: None,
            weather_info: None,
            destination_image: None,
            cover_image: None,
            created_at: None,
            last_updated: None,
            markdown_description: None,
        }
    }

    fn enricher(backend: Arc<dyn GeocodeBackend>) -> CoordinateEnricher {
        CoordinateEnricher::new(AgentToolGeocode::new(backend), Duration::from_millis(0))
    }

    #[tokio::test]
    async fn test_enrich_fills_missing_coordinates_in_pairs() {
        let backend = ScriptedBackend {
            answers: HashMap::from([("Louvre, Paris".to_string(), (48.8606, 2.3376))]),
        };
        let mut report = report_with_locations(vec![location("Louvre")]);

        let filled = enricher(Arc::new(backend)).enrich(&mut report, "Paris").await;

        assert_eq!(filled, 1);
        let enriched = &report.day_plans[0].activities[0].location;
        assert_eq!(enriched.latitude, Some(48.8606));
        assert_eq!(enriched.longitude, Some(2.3376));
    }

    #[tokio::test]
    async fn test_enrich_never_touches_populated_locations() {
        let backend = ScriptedBackend {
            answers: HashMap::from([("Louvre, Paris".to_string(), (0.0, 0.0))]),
        };
        let mut populated = location("Louvre");
        populated.latitude = Some(48.8606);
        populated.longitude = Some(2.3376);
        let mut report = report_with_locations(vec![populated]);

        let filled = enricher(Arc::new(backend)).enrich(&mut report, "Paris").await;

        assert_eq!(filled, 0);
        let untouched = &report.day_plans[0].activities[0].location;
        assert_eq!(untouched.latitude, Some(48.8606));
        assert_eq!(untouched.longitude, Some(2.3376));
    }

    #[tokio::test]
    async fn test_enrich_failure_leaves_coordinates_null() {
        let mut report = report_with_locations(vec![location("Louvre"), location("Orsay")]);

        let filled = enricher(Arc::new(FailingBackend)).enrich(&mut report, "Paris").await;

        assert_eq!(filled, 0);
        for activity in &report.day_plans[0].activities {
            assert!(activity.location.latitude.is_none());
            assert!(activity.location.longitude.is_none());
        }
    }

    #[tokio::test]
    async fn test_enrich_never_assigns_a_single_coordinate() {
        let backend = ScriptedBackend {
            answers: HashMap::from([("Louvre, Paris".to_string(), (48.8606, 2.3376))]),
        };
        let mut report = report_with_locations(vec![location("Louvre"), location("Unknown")]);

        enricher(Arc::new(backend)).enrich(&mut report, "Paris").await;

        for activity in &report.day_plans[0].activities {
            let location = &activity.location;
            assert_eq!(
                location.latitude.is_some(),
                location.longitude.is_some(),
                "coordinates must be assigned in pairs"
            );
        }
    }

    #[tokio::test]
    async fn test_enrich_covers_attraction_and_place_lists() {
        let backend = ScriptedBackend {
            answers: HashMap::from([
                ("Louvre, Paris".to_string(), (48.8606, 2.3376)),
                ("Eiffel Tower, Paris".to_string(), (48.8584, 2.2945)),
            ]),
        };
        let mut report = report_with_locations(vec![location("Louvre")]);
        report.top_attractions = Some(vec![location("Eiffel Tower")]);
        report.must_visit_places = Some(vec![location("Hidden Spot")]);

        let filled = enricher(Arc::new(backend)).enrich(&mut report, "Paris").await;

        assert_eq!(filled, 2);
        let attraction = &report.top_attractions.as_ref().unwrap()[0];
        assert_eq!(attraction.latitude, Some(48.8584));
        let place = &report.must_visit_places.as_ref().unwrap()[0];
        assert!(place.latitude.is_none() && place.longitude.is_none());
    }
}
