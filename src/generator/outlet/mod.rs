//! 输出出口 - 确定性的markdown合成与落盘
//!
//! markdown渲染是纯函数：固定的章节顺序与格式符号，相同报告输入
//! 产出逐字节相同的文档。没有任何外部调用。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::types::{ItineraryOutcome, ItineraryReport};

/// 把校验通过的行程报告渲染成markdown文档
pub fn render_markdown(report: &ItineraryReport) -> String {
    let mut md = String::new();

    // 标题与概述
    md.push_str(&format!("# {} Travel Itinerary\n", report.destination));
    md.push_str("## Overview\n");
    md.push_str(&format!("{}\n", report.summary));
    md.push_str("\n---\n");

    // 行程要素
    md.push_str("## Travel Details\n");
    md.push_str(&format!("- **Duration:** {} days\n", report.total_days));
    if let Some(travel_type) = &report.travel_type {
        md.push_str(&format!("- **Travel Type:** {}\n", travel_type));
    }
    if let Some(budget_estimate) = &report.budget_estimate {
        md.push_str(&format!("- **Estimated Budget:** {}\n", budget_estimate));
    }
    if let Some(best_time) = &report.best_time_to_visit {
        md.push_str(&format!("- **Best Time to Visit:** {}\n", best_time));
    }
    md.push('\n');

    // 逐日行程
    if !report.day_plans.is_empty() {
        md.push_str("## Day-by-Day Itinerary\n\n");
        for day_plan in &report.day_plans {
            md.push_str(&format!(
                "### Day {}: {}\n\n",
                day_plan.day_number, day_plan.title
            ));
            if let Some(description) = &day_plan.description {
                md.push_str(&format!("*{}*\n\n", description));
            }

            if !day_plan.activities.is_empty() {
                md.push_str("#### Activities\n\n");
                for (index, activity) in day_plan.activities.iter().enumerate() {
                    md.push_str(&format!("**{}. {}**\n\n", index + 1, activity.name));
                    if let Some(description) = &activity.description {
                        md.push_str(&format!("{}\n\n", description));
                    }

                    md.push_str(&format!("- **Location:** {}", activity.location.name));
                    if let Some(address) = &activity.location.address {
                        md.push_str(&format!(" ({})", address));
                    }
                    if let Some(rating) = activity.location.rating {
                        md.push_str(&format!(" ⭐ {}/5", rating));
                    }
                    md.push('\n');

                    if let (Some(start_time), Some(end_time)) =
                        (&activity.start_time, &activity.end_time)
                    {
                        md.push_str(&format!("- **Time:** {} - {}\n", start_time, end_time));
                    }
                    if let Some(cost_estimate) = &activity.cost_estimate {
                        md.push_str(&format!("- **Cost:** {}\n", cost_estimate));
                    }
                    if let Some(tips) = &activity.tips
                        && !tips.is_empty()
                    {
                        md.push_str(&format!("- **Tips:** {}\n", tips.join(", ")));
                    }
                    md.push('\n');
                }
            }

            if let Some(highlights) = &day_plan.highlights
                && !highlights.is_empty()
            {
                md.push_str(&format!("**Highlights:** {}\n\n", highlights.join(", ")));
            }
            if let Some(estimated_cost) = &day_plan.estimated_cost {
                md.push_str(&format!("**Estimated Cost:** {}\n\n", estimated_cost));
            }
            if let Some(notes) = &day_plan.notes {
                md.push_str(&format!("*Note: {}*\n\n", notes));
            }
            md.push_str("---\n\n");
        }
    }

    // 热门景点（最多展示10个）
    if let Some(attractions) = &report.top_attractions
        && !attractions.is_empty()
    {
        md.push_str("## Top Attractions\n\n");
        for (index, attraction) in attractions.iter().take(10).enumerate() {
            md.push_str(&format!("{}. **{}**", index + 1, attraction.name));
            if let Some(rating) = attraction.rating {
                md.push_str(&format!(" ⭐ {}/5", rating));
            }
            if let Some(address) = &attraction.address {
                md.push_str(&format!("\n   - {}", address));
            }
            if let Some(category) = &attraction.category {
                md.push_str(&format!("\n   - Category: {}", category));
            }
            md.push_str("\n\n");
        }
    }

    // 必去地点（最多展示10个）
    if let Some(places) = &report.must_visit_places
        && !places.is_empty()
    {
        md.push_str("## Must-Visit Places\n\n");
        for place in places.iter().take(10) {
            md.push_str(&format!("- **{}**", place.name));
            if let Some(rating) = place.rating {
                md.push_str(&format!(" ⭐ {}/5", rating));
            }
            md.push('\n');
        }
        md.push('\n');
    }

    // 住宿推荐
    if let Some(accommodations) = &report.accommodation_recommendations
        && !accommodations.is_empty()
    {
        md.push_str("## Accommodation Recommendations\n\n");
        for accommodation in accommodations {
            md.push_str(&format!("### {}\n\n", accommodation.name));
            md.push_str(&format!(
                "- **Type:** {}\n",
                accommodation.kind.as_deref().unwrap_or("Not specified")
            ));
            if let Some(location) = &accommodation.location {
                md.push_str(&format!("- **Location:** {}\n", location));
            }
            if let Some(price_range) = &accommodation.price_range {
                md.push_str(&format!("- **Price Range:** {}\n", price_range));
            }
            if let Some(rating) = accommodation.rating {
                md.push_str(&format!("- **Rating:** ⭐ {}/5", rating));
                if let Some(review_count) = accommodation.review_count {
                    md.push_str(&format!(" ({} reviews)", review_count));
                }
                md.push('\n');
            }
            if let Some(reason) = &accommodation.recommendation_reason {
                md.push_str(&format!("- **Why:** {}\n", reason));
            }
            if let Some(amenities) = &accommodation.amenities
                && !amenities.is_empty()
            {
                md.push_str(&format!("- **Amenities:** {}\n", amenities.join(", ")));
            }
            md.push('\n');
        }
    }

    // 交通
    if let Some(transportation_tips) = &report.transportation_tips
        && !transportation_tips.is_empty()
    {
        md.push_str("## Transportation\n\n");
        for transport in transportation_tips {
            md.push_str(&format!("### {}\n\n", transport.kind));
            if let Some(route) = &transport.route {
                md.push_str(&format!("- **Route:** {}\n", route));
            }
            if let Some(estimated_cost) = &transport.estimated_cost {
                md.push_str(&format!("- **Cost:** {}\n", estimated_cost));
            }
            if let Some(duration) = &transport.duration {
                md.push_str(&format!("- **Duration:** {}\n", duration));
            }
            if let Some(tips) = &transport.tips
                && !tips.is_empty()
            {
                md.push_str("**Tips:**\n");
                for tip in tips {
                    md.push_str(&format!("- {}\n", tip));
                }
            }
            md.push('\n');
        }
    }

    if let Some(local_transport) = &report.local_transport {
        md.push_str(&format!("### Local Transportation\n\n{}\n\n", local_transport));
    }

    // 通用建议
    if let Some(general_tips) = &report.general_tips
        && !general_tips.is_empty()
    {
        md.push_str("## General Travel Tips\n\n");
        for tip in general_tips {
            md.push_str(&format!("- {}\n", tip));
        }
        md.push('\n');
    }

    // 文化提示
    if let Some(cultural_notes) = &report.cultural_notes
        && !cultural_notes.is_empty()
    {
        md.push_str("## Cultural Information\n\n");
        for note in cultural_notes {
            md.push_str(&format!("- {}\n", note));
        }
        md.push('\n');
    }

    // 天气
    if let Some(weather_info) = &report.weather_info {
        md.push_str(&format!("## Weather Information\n\n{}\n\n", weather_info));
    }

    // 最佳旅行时间
    if let Some(best_time) = &report.best_time_to_visit {
        md.push_str(&format!("## Best Time to Visit\n\n{}\n\n", best_time));
    }

    md
}

/// 保存生成结果到输出目录
pub fn save(outcome: &ItineraryOutcome, output_path: &Path) -> Result<()> {
    println!("\n🖊️ 行程文档存储中...");

    fs::create_dir_all(output_path)
        .context(format!("Failed to create output dir: {:?}", output_path))?;

    let json_path = output_path.join("itinerary.json");
    let json = serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?;
    fs::write(&json_path, json).context(format!("Failed to write {:?}", json_path))?;

    if let Some(markdown) = outcome
        .itinerary
        .as_ref()
        .and_then(|report| report.markdown_description.as_ref())
    {
        let md_path = output_path.join("itinerary.md");
        fs::write(&md_path, markdown).context(format!("Failed to write {:?}", md_path))?;
    }

    println!("✅ 行程文档已保存至 {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Accommodation, Activity, DayPlan, Location};
    use tempfile::TempDir;

    fn sample_report() -> ItineraryReport {
        ItineraryReport {
            summary: "Three slow days in Paris".to_string(),
            destination: "Paris".to_string(),
            total_days: 1,
            travel_type: Some("cultural".to_string()),
            budget_estimate: Some("€800".to_string()),
            day_plans: vec![DayPlan {
                day_number: 1,
                date: None,
                title: "Arrival".to_string(),
                description: Some("Historic heart of the city".to_string()),
                theme: None,
                activities: vec![Activity {
                    name: "Louvre visit".to_string(),
                    description: Some("World-class art museum".to_string()),
                    location: Location {
                        name: "Louvre".to_string(),
                        address: Some("Rue de Rivoli".to_string()),
                        latitude: Some(48.8606),
                        longitude: Some(2.3376),
                        rating: Some(4.7),
                        review_count: Some(200000),
                        category: Some("museum".to_string()),
                        image_url: None,
                        image_alt: None,
                    },
                    start_time: Some("09:00".to_string()),
                    end_time: Some("12:00".to_string()),
                    duration_hours: Some(3.0),
                    cost_estimate: Some("€17".to_string()),
                    tips: Some(vec!["Book online".to_string()]),
                    priority: Some(1),
                    image_url: None,
                    booking_info: None,
                }],
                estimated_cost: Some("€60".to_string()),
                notes: None,
                highlights: Some(vec!["Mona Lisa".to_string()]),
            }],
            top_attractions: Some(vec![Location {
                name: "Eiffel Tower".to_string(),
                address: Some("Champ de Mars".to_string()),
                latitude: Some(48.8584),
                longitude: Some(2.2945),
                rating: Some(4.6),
                review_count: None,
                category: Some("landmark".to_string()),
                image_url: None,
                image_alt: None,
            }]),
            must_visit_places: None,
            accommodation_recommendations: Some(vec![Accommodation {
                name: "Hotel Lutetia".to_string(),
                kind: Some("hotel".to_string()),
                location: Some("Saint-Germain".to_string()),
                address: None,
                price_range: Some("€€€".to_string()),
                rating: Some(4.5),
                review_count: Some(1200),
                recommendation_reason: Some("Central and quiet".to_string()),
                image_url: None,
                amenities: Some(vec!["wifi".to_string(), "spa".to_string()]),
                booking_url: None,
            }]),
            transportation_tips: None,
            local_transport: Some("Metro day passes are the cheapest option".to_string()),
            general_tips: Some(vec!["Learn basic French phrases".to_string()]),
            cultural_notes: None,
            best_time_to_visit: Some("April to June".to_string()),
            weather_info: Some("Mild spring weather".to_string()),
            destination_image: None,
            cover_image: None,
            created_at: None,
            last_updated: None,
            markdown_description: None,
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = sample_report();
        let first = render_markdown(&report);
        let second = render_markdown(&report);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_section_order_and_content() {
        let markdown = render_markdown(&sample_report());

        assert!(markdown.starts_with("# Paris Travel Itinerary\n"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("## Travel Details"));
        assert!(markdown.contains("### Day 1: Arrival"));
        assert!(markdown.contains("**1. Louvre visit**"));
        assert!(markdown.contains("- **Location:** Louvre (Rue de Rivoli) ⭐ 4.7/5"));
        assert!(markdown.contains("- **Time:** 09:00 - 12:00"));
        assert!(markdown.contains("**Highlights:** Mona Lisa"));
        assert!(markdown.contains("## Top Attractions"));
        assert!(markdown.contains("1. **Eiffel Tower** ⭐ 4.6/5"));
        assert!(markdown.contains("## Accommodation Recommendations"));
        assert!(markdown.contains("- **Rating:** ⭐ 4.5/5 (1200 reviews)"));
        assert!(markdown.contains("### Local Transportation"));
        assert!(markdown.contains("## General Travel Tips"));
        assert!(markdown.contains("## Weather Information"));
        assert!(markdown.contains("## Best Time to Visit"));

        // 章节顺序固定：日程在景点之前，景点在住宿之前
        let day_index = markdown.find("## Day-by-Day Itinerary").unwrap();
        let attractions_index = markdown.find("## Top Attractions").unwrap();
        let accommodation_index = markdown.find("## Accommodation Recommendations").unwrap();
        assert!(day_index < attractions_index);
        assert!(attractions_index < accommodation_index);
    }

    #[test]
    fn test_render_omits_empty_sections() {
        let mut report = sample_report();
        report.top_attractions = None;
        report.accommodation_recommendations = None;
        report.general_tips = None;
        report.weather_info = None;
        report.local_transport = None;

        let markdown = render_markdown(&report);
        assert!(!markdown.contains("## Top Attractions"));
        assert!(!markdown.contains("## Accommodation Recommendations"));
        assert!(!markdown.contains("## General Travel Tips"));
        assert!(!markdown.contains("## Weather Information"));
        assert!(!markdown.contains("### Local Transportation"));
    }

    #[test]
    fn test_save_writes_json_and_markdown() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("out");

        let mut report = sample_report();
        report.markdown_description = Some(render_markdown(&report));
        let outcome = ItineraryOutcome::success(report, 1.23);

        save(&outcome, &output_path).unwrap();

        assert!(output_path.join("itinerary.json").exists());
        assert!(output_path.join("itinerary.md").exists());

        let json = std::fs::read_to_string(output_path.join("itinerary.json")).unwrap();
        assert!(json.contains("\"success\": true"));
    }

    #[test]
    fn test_save_failure_outcome_writes_json_only() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("out");

        let outcome = ItineraryOutcome::failure("Error generating itinerary: boom", 0.5);
        save(&outcome, &output_path).unwrap();

        assert!(output_path.join("itinerary.json").exists());
        assert!(!output_path.join("itinerary.md").exists());
    }
}
