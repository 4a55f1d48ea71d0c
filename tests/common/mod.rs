//! Common test utilities

use chrono::{NaiveDate, Weekday};
use studyplan::models::{ComplexityTier, PlanRequest, PlanWindow, Topic, WeeklyTemplate};

/// Date in January 2024 (2024-01-15 is a Monday)
pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

/// Monday through Saturday at `hours`, Sunday off
#[allow(dead_code)]
pub fn six_day_template(hours: f64) -> WeeklyTemplate {
    WeeklyTemplate::uniform(hours).with_day(Weekday::Sun, 0.0)
}

/// A small mixed catalog covering every tier
pub fn mixed_catalog() -> Vec<Topic> {
    vec![
        Topic::new(1, "Cell Biology", ComplexityTier::Low).with_priority(2),
        Topic::new(2, "Cardiovascular Physiology", ComplexityTier::High).with_priority(1),
        Topic::new(3, "Renal Physiology", ComplexityTier::Medium).with_priority(1),
        Topic::new(4, "Organic Chemistry", ComplexityTier::High)
            .with_priority(3)
            .with_sub_unit("Part 1", 1.0)
            .with_sub_unit("Part 2", 1.0),
        Topic::new(5, "Statistics", ComplexityTier::Medium).with_weight(1.5),
    ]
}

/// Four weeks of six-day, three-hour availability for `mixed_catalog`
#[allow(dead_code)]
pub fn mixed_request() -> PlanRequest {
    PlanRequest::new(
        mixed_catalog(),
        six_day_template(3.0),
        PlanWindow::new(jan(15), NaiveDate::from_ymd_opt(2024, 2, 12).unwrap()).with_buffer(2),
    )
}

/// Example request in the on-disk TOML format
#[allow(dead_code)]
pub const SAMPLE_REQUEST_TOML: &str = r#"
[window]
start = "2024-01-15"
exam = "2024-02-12"
buffer_days = 2

[template]
mon = 2.0
tue = 2.0
wed = 2.0
thu = 2.0
fri = 2.0
sat = 3.0

[[topics]]
id = 1
title = "Acid-Base Balance"
tier = "high"

[[topics]]
id = 2
title = "Cell Membranes"
tier = 2
priority = 2

[[topics]]
id = 3
title = "Pharmacokinetics"
tier = "MEDIUM"

[[topics.sub_units]]
label = "Part 1"
weight = 1.0

[[topics.sub_units]]
label = "Part 2"
weight = 0.5

[[overrides]]
pattern = "acid"
multiplier = 1.5
match_mode = "keyword"
"#;
