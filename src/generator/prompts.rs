//! 提示词模板引擎 - 把请求字段、调研上下文与schema指令渲染成最终提示词
//!
//! 这里全部是纯函数：相同输入总是产出逐字节相同的提示词文本。

use schemars::schema_for;

use crate::types::{ItineraryReport, TripRequest};

/// 调研Agent的系统提示词
pub const RESEARCH_PREAMBLE: &str = "You are an expert travel planner AI. \
Your task is to research a destination with the available tools and produce a \
comprehensive research summary: top attractions and must-visit places, ratings \
and reviews, price levels, weather, local customs, transportation options and \
useful image URLs. Prefer concrete, recent information gathered via tools over \
general knowledge.";

/// 结构化输出的格式说明，内嵌行程报告的JSON Schema
pub fn format_instructions() -> String {
    let schema = schema_for!(ItineraryReport);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\n```\n{}\n```",
        schema_json
    )
}

/// 构建调研任务输入 - 结构化的研究简报
pub fn research_brief(request: &TripRequest) -> String {
    let destination = &request.destination;
    let duration = request.duration;
    let start_date = request.start_date_or_default();
    let difficulty_level = request.difficulty_or_default();
    let budget_range = request.budget_or_default();
    let interests = request.interests_or_default();
    let group_size = request.group_size;
    let accommodation_type = request.accommodation_or_default();

    let mut input_text = format!(
        "Plan a {duration}-day trip to {destination}

Trip Details:
- Duration: {duration} days
- Start Date: {start_date}
- Difficulty Level: {difficulty_level}
- Budget Range: {budget_range}
- Interests: {interests}
- Group Size: {group_size} people
- Accommodation Preference: {accommodation_type}
"
    );

    if let Some(notes) = request.notes.as_deref().filter(|notes| !notes.is_empty()) {
        input_text.push_str(&format!("- Additional Notes: {}\n", notes));
    }

    input_text.push_str(&format!(
        "
Research Requirements:
1. Search for top attractions and activities in {destination} that match interests: {interests}
2. Find places suitable for groups of {group_size} people
3. Get ratings and reviews for recommended places
4. Find {accommodation_type} accommodation options within {budget_range} budget range
5. Research activities matching {difficulty_level} difficulty level
6. Compare prices for accommodations, food, and activities in the {budget_range} range
7. Get weather information"
    ));

    if start_date != "not specified" {
        input_text.push_str(&format!(" for {}", start_date));
    }

    input_text.push_str(&format!(
        "
8. Get local customs and cultural tips for {destination}
9. Research transportation options suitable for {group_size} travelers
10. Find image URLs from search results for:
    - Destination cover image
    - Attraction/location images matching interests ({interests})
    - Activity images suitable for {difficulty_level} level
    - {accommodation_type} accommodation images

IMPORTANT:
- Focus on activities and places that align with: {interests}
- Ensure all recommendations fit the {budget_range} budget range
- Activities should match {difficulty_level} difficulty level
- Consider group size of {group_size} for all recommendations
- Prioritize {accommodation_type} accommodation types

Use all available tools to gather comprehensive information about {destination}.
"
    ));

    input_text.trim().to_string()
}

/// 确定性调研模式的总结提示词
pub fn research_summary_prompt(findings: &str, brief: &str) -> String {
    format!(
        "You are an expert travel planner AI. Based on the research findings below, provide a comprehensive summary.

Research Findings:
{findings}

User Query: {brief}

Provide a well-structured summary including:
1. Top attractions and must-visit places
2. Ratings and reviews when mentioned
3. Price information if available
4. Weather and best time to visit
5. Cultural tips and local customs
6. General recommendations

Comprehensive Summary:"
    )
}

/// 构建最终生成提示词
///
/// 八个请求字段全部代入固定模板；模板明确要求精确的天数、0-5评分
/// 标尺（含换算示例）、每个地点的经纬度，并逐字嵌入格式说明。
pub fn generation_prompt(
    request: &TripRequest,
    research_context: &str,
    format_instructions: &str,
) -> String {
    let destination_text = format!("Destination: {}", request.destination);
    let duration_text = format!("Duration: {} days", request.duration);
    let start_date_text = format!("Start Date: {}", request.start_date_or_default());
    let difficulty_text = format!(
        "Difficulty Level: {}",
        request.difficulty_level.as_deref().unwrap_or("not specified")
    );
    let budget_text = format!(
        "Budget Range: {}",
        request.budget_range.as_deref().unwrap_or("not specified")
    );
    let interests_text = format!(
        "Interests: {}",
        request.interests.as_deref().unwrap_or("not specified")
    );
    let group_size_text = format!("Group Size: {} people", request.group_size);
    let accommodation_text = format!(
        "Accommodation Type: {}",
        request
            .accommodation_type
            .as_deref()
            .unwrap_or("not specified")
    );

    format!(
        "You are an expert travel planner AI assistant. Create a comprehensive travel itinerary.

User Requirements:
{destination_text}
{duration_text}
{start_date_text}
{difficulty_text}
{budget_text}
{interests_text}
{group_size_text}
{accommodation_text}

Instructions:
1. Create detailed day-by-day itinerary with specific activities
2. Include times, locations, and costs for each activity
3. Provide ratings and reviews for all recommended places
4. Include image URLs when available from search results
5. Add accommodation recommendations with details
6. Include transportation tips and local information
7. Provide cultural tips and best practices

IMPORTANT OUTPUT REQUIREMENTS:
- day_plans: REQUIRED - Must have at least one day plan with:
  - day_number: Sequential day number
  - title: Descriptive title for the day
  - description: Overview of the day
  - activities: List of activities, each with:
    - name: Activity name
    - description: Detailed description
    - location: Location object with name, address, rating, image_url, latitude, longitude
    - start_time and end_time: Time slots
    - cost_estimate: Estimated cost
    - image_url: Image URL if found from search

- top_attractions: List of top places with:
  - name, address, rating, review_count, latitude, longitude
  - image_url: Image URL from search results
  - category: Type of attraction

- must_visit_places: List with:
  - name, address, rating, latitude, longitude
  - image_url: Image URL if available

- accommodation_recommendations: List with:
  - name, type, location, price_range, rating
  - image_url: Image URL if available
  - amenities: List of amenities

- Include destination_image and cover_image URLs if found
- Include weather_info and cultural_notes
- Provide detailed general_tips and transportation_tips

CRITICAL RULES:
1. For all locations, places, and attractions, you MUST include latitude and longitude coordinates
   whenever you know them; unknown coordinates will be filled in automatically afterwards.

2. ALL RATINGS MUST BE ON A 0-5 SCALE (not 0-10). If you find ratings on a 0-10 scale, divide by 2.
   Example: If a place has 8.9/10 rating, convert it to 4.5/5.

Output Format:
{format_instructions}

Research Findings from Agent:
{research_context}

Based on the research findings above and the user requirements, generate a comprehensive itinerary report in the exact JSON format specified in the format instructions.
Make sure to:
1. Create exactly {duration} day plans
2. Match activities to the {difficulty} difficulty level
3. Keep recommendations within the {budget} budget range
4. Focus on interests: {interests}
5. Ensure activities are suitable for a group of {group_size}
6. Recommend {accommodation} accommodation types
7. Use the information gathered from the tools to create accurate and detailed plans
",
        duration = request.duration,
        difficulty = request.difficulty_or_default(),
        budget = request.budget_or_default(),
        interests = request.interests_or_default(),
        group_size = request.group_size,
        accommodation = request.accommodation_or_default(),
    )
}
