// Core data structures for study planning

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::scheduler::error::SchedulerError;
use crate::scheduler::materializer::DeficitWarning;
use crate::scheduler::overrides::OverrideRule;

// ============================================================================
// Complexity Tier
// ============================================================================

/// Complexity class of a topic
///
/// Deserializes from a name (`"low"`, `"MEDIUM"`) or from the 1-5 numeric
/// scale used by some catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "TierRepr")]
pub enum ComplexityTier {
    Low,
    Medium,
    High,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TierRepr {
    Level(u8),
    Name(String),
}

impl TryFrom<TierRepr> for ComplexityTier {
    type Error = SchedulerError;

    fn try_from(repr: TierRepr) -> Result<Self, Self::Error> {
        match repr {
            TierRepr::Level(level) => {
                Self::from_level(level).ok_or_else(|| SchedulerError::invalid_tier(level.to_string()))
            }
            TierRepr::Name(name) => name.parse(),
        }
    }
}

impl ComplexityTier {
    /// All tiers, lowest first
    pub fn all() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    /// Map the 1-5 numeric scale onto tiers
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 | 2 => Some(Self::Low),
            3 => Some(Self::Medium),
            4 | 5 => Some(Self::High),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Upper-case label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Relative complexity weight
    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ComplexityTier {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "easy" => Ok(Self::Low),
            "medium" | "mid" | "moderate" => Ok(Self::Medium),
            "high" | "hard" => Ok(Self::High),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(Self::from_level)
                .ok_or_else(|| SchedulerError::invalid_tier(s)),
        }
    }
}

// ============================================================================
// Topics
// ============================================================================

fn default_weight() -> f64 {
    1.0
}

fn default_priority() -> u32 {
    1
}

/// One part of a multi-part topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubUnit {
    /// Label such as "Part 2"
    pub label: String,

    /// Effort weight of this part
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl SubUnit {
    pub fn new(label: impl Into<String>, weight: f64) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// A study topic from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    pub tier: ComplexityTier,

    /// Priority rank, 1 is the most important
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Explicit base pass count, replaces the tier default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passes: Option<u32>,

    /// Effort weight for topics without sub-units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Ordered parts, in label order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_units: Vec<SubUnit>,
}

impl Topic {
    /// Create a topic with default priority and weight
    pub fn new(id: u64, title: impl Into<String>, tier: ComplexityTier) -> Self {
        Self {
            id,
            title: title.into(),
            tier,
            priority: default_priority(),
            passes: None,
            weight: None,
            sub_units: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_passes(mut self, passes: u32) -> Self {
        self.passes = Some(passes);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Append a part; parts keep insertion order
    pub fn with_sub_unit(mut self, label: impl Into<String>, weight: f64) -> Self {
        self.sub_units.push(SubUnit::new(label, weight));
        self
    }

    pub fn has_sub_units(&self) -> bool {
        !self.sub_units.is_empty()
    }

    /// Total effort weight
    ///
    /// For multi-part topics this is always the sum of the parts.
    pub fn effort_weight(&self) -> f64 {
        if self.has_sub_units() {
            self.sub_units.iter().map(|s| s.weight).sum()
        } else {
            self.weight.unwrap_or_else(default_weight)
        }
    }
}

// ============================================================================
// Availability Inputs
// ============================================================================

/// Study hours available on each weekday
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyTemplate {
    pub mon: f64,
    pub tue: f64,
    pub wed: f64,
    pub thu: f64,
    pub fri: f64,
    pub sat: f64,
    pub sun: f64,
}

impl WeeklyTemplate {
    /// Template with zero hours on every day
    pub fn new() -> Self {
        Self::default()
    }

    /// Same hours on all seven days
    pub fn uniform(hours: f64) -> Self {
        Self {
            mon: hours,
            tue: hours,
            wed: hours,
            thu: hours,
            fri: hours,
            sat: hours,
            sun: hours,
        }
    }

    pub fn with_day(mut self, weekday: Weekday, hours: f64) -> Self {
        *self.slot_mut(weekday) = hours;
        self
    }

    fn slot_mut(&mut self, weekday: Weekday) -> &mut f64 {
        match weekday {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        }
    }

    pub fn hours_for(&self, weekday: Weekday) -> f64 {
        match weekday {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    /// (weekday, hours) pairs, Monday first
    pub fn entries(&self) -> [(Weekday, f64); 7] {
        [
            (Weekday::Mon, self.mon),
            (Weekday::Tue, self.tue),
            (Weekday::Wed, self.wed),
            (Weekday::Thu, self.thu),
            (Weekday::Fri, self.fri),
            (Weekday::Sat, self.sat),
            (Weekday::Sun, self.sun),
        ]
    }

    pub fn weekly_total(&self) -> f64 {
        self.entries().iter().map(|(_, h)| h).sum()
    }
}

/// Date range of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWindow {
    pub start: NaiveDate,
    pub exam: NaiveDate,

    /// Days before the exam kept free of sessions
    ///
    /// `None` when the request leaves it unset; callers with a configured
    /// default fill it in, otherwise no buffer applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_days: Option<u32>,
}

impl PlanWindow {
    pub fn new(start: NaiveDate, exam: NaiveDate) -> Self {
        Self {
            start,
            exam,
            buffer_days: None,
        }
    }

    pub fn with_buffer(mut self, days: u32) -> Self {
        self.buffer_days = Some(days);
        self
    }

    /// Effective buffer in days
    pub fn buffer(&self) -> u32 {
        self.buffer_days.unwrap_or(0)
    }

    /// Last date that may carry a session (`exam - buffer`)
    pub fn last_eligible_date(&self) -> Option<NaiveDate> {
        self.exam.checked_sub_days(Days::new(u64::from(self.buffer())))
    }

    /// Check `start < exam - buffer`
    pub fn is_valid(&self) -> bool {
        self.last_eligible_date().is_some_and(|last| self.start < last)
    }
}

/// A study-eligible calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableDay {
    pub date: NaiveDate,
    pub weekday: Weekday,

    /// Hour budget from the weekly template
    pub hours: f64,

    /// Elapsed fraction of the window, 0.0 on the start date
    pub progress: f64,
}

impl AvailableDay {
    pub fn new(date: NaiveDate, hours: f64, progress: f64) -> Self {
        Self {
            date,
            weekday: date.weekday(),
            hours,
            progress,
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Kind of study session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionType {
    /// First exposure
    Study,
    /// Reinforcement pass
    Review,
    /// Final validation pass
    Test,
}

impl SessionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Study => "STUDY",
            Self::Review => "REVIEW",
            Self::Test => "TEST",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A dated study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub date: NaiveDate,
    pub topic_id: u64,
    pub topic_title: String,

    /// Sub-unit label for multi-part topics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,

    pub session_type: SessionType,

    /// Pass index, 1 = first exposure
    pub pass: u32,

    pub hours: f64,

    /// Position within the day, starting at 0
    pub sequence: usize,
}

impl StudySession {
    /// Display label: title plus part, if any
    pub fn unit_label(&self) -> String {
        match &self.part {
            Some(part) => format!("{} ({})", self.topic_title, part),
            None => self.topic_title.clone(),
        }
    }
}

/// SHA-256 digest of a session sequence
///
/// Identical sequences always produce the same digest, which lets callers
/// detect regenerations that changed nothing.
pub fn session_fingerprint(sessions: &[StudySession]) -> String {
    let mut hasher = Sha256::new();
    for s in sessions {
        hasher.update(
            format!(
                "{}|{}|{}|{}|{}|{}|{}\n",
                s.date,
                s.topic_id,
                s.part.as_deref().unwrap_or(""),
                s.session_type,
                s.pass,
                s.hours,
                s.sequence
            )
            .as_bytes(),
        );
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Plans
// ============================================================================

/// Everything a generation run consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub topics: Vec<Topic>,
    pub template: WeeklyTemplate,
    pub window: PlanWindow,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideRule>,
}

impl PlanRequest {
    pub fn new(topics: Vec<Topic>, template: WeeklyTemplate, window: PlanWindow) -> Self {
        Self {
            topics,
            template,
            window,
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, rule: OverrideRule) -> Self {
        self.overrides.push(rule);
        self
    }
}

/// Lifecycle state of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    Draft,
    Generating,
    Active,
    Failed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Generating => "GENERATING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
        }
    }

    /// Allowed lifecycle transitions
    ///
    /// Only GENERATING may move to ACTIVE or FAILED, and GENERATING can
    /// only be entered from a settled state.
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Generating)
                | (Self::Active, Self::Generating)
                | (Self::Failed, Self::Generating)
                | (Self::Generating, Self::Active)
                | (Self::Generating, Self::Failed)
        )
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's study plan with its generated sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub id: Uuid,
    pub user_id: String,
    pub status: PlanStatus,
    pub request: PlanRequest,
    pub sessions: Vec<StudySession>,

    /// Inputs queued for an ACTIVE plan, committed by the next successful
    /// generation. `request` always describes the stored sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_request: Option<PlanRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deficit_warning: Option<DeficitWarning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudyPlan {
    /// Create a DRAFT plan with no sessions
    pub fn new(user_id: impl Into<String>, request: PlanRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            status: PlanStatus::Draft,
            request,
            sessions: Vec::new(),
            pending_request: None,
            deficit_warning: None,
            fingerprint: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.sessions.iter().map(|s| s.hours).sum()
    }

    /// Inputs the next generation runs on
    pub fn effective_request(&self) -> &PlanRequest {
        self.pending_request.as_ref().unwrap_or(&self.request)
    }
}
