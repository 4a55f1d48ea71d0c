//! Distribution analysis
//!
//! Read-only report over a finished session set: sessions, hours and review
//! counts bucketed by complexity tier, plus a fairness ratio across tiers.
//! Nothing here mutates or regenerates sessions.

use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};

use super::error::{SchedulerError, SchedulerResult};
use crate::models::{ComplexityTier, SessionType, StudySession, Topic};

// ============================================================================
// Bucket Statistics
// ============================================================================

/// Per-tier summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityBucketStats {
    pub tier: ComplexityTier,
    pub topic_count: usize,
    pub total_sessions: usize,
    pub avg_sessions_per_topic: f64,
    pub total_hours: f64,

    /// Fewest REVIEW sessions received by a topic in this tier
    pub min_review_sessions: usize,

    /// Most REVIEW sessions received by a topic in this tier
    pub max_review_sessions: usize,

    /// Population standard deviation of sessions per topic
    pub session_std_dev: f64,
}

impl ComplexityBucketStats {
    /// Zero-filled bucket for a tier without topics
    pub fn empty(tier: ComplexityTier) -> Self {
        Self {
            tier,
            topic_count: 0,
            total_sessions: 0,
            avg_sessions_per_topic: 0.0,
            total_hours: 0.0,
            min_review_sessions: 0,
            max_review_sessions: 0,
            session_std_dev: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topic_count == 0
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TopicTally {
    sessions: usize,
    reviews: usize,
    hours: f64,
}

// ============================================================================
// Report
// ============================================================================

/// Distribution of effort across complexity tiers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    /// One bucket per tier, always all three
    pub by_tier: BTreeMap<ComplexityTier, ComplexityBucketStats>,

    /// Highest over lowest average sessions per topic, among non-empty
    /// tiers. `None` when the lowest average is zero.
    pub fairness_ratio: Option<f64>,

    pub total_topics: usize,
    pub total_sessions: usize,
}

impl DistributionReport {
    pub fn bucket(&self, tier: ComplexityTier) -> Option<&ComplexityBucketStats> {
        self.by_tier.get(&tier)
    }

    /// Format as display string
    pub fn display(&self) -> String {
        let mut output = String::from("Distribution by Complexity\n");
        output.push_str(&format!("{:-<60}\n", ""));
        output.push_str(&format!(
            "Topics: {}  Sessions: {}\n\n",
            self.total_topics, self.total_sessions
        ));

        for stats in self.by_tier.values() {
            output.push_str(&format!(
                "  {:<6} topics {:>3}  sessions {:>4}  avg {:>5.2}  hours {:>6.1}  reviews {}-{}  sd {:.2}\n",
                stats.tier.label(),
                stats.topic_count,
                stats.total_sessions,
                stats.avg_sessions_per_topic,
                stats.total_hours,
                stats.min_review_sessions,
                stats.max_review_sessions,
                stats.session_std_dev
            ));
        }

        match self.fairness_ratio {
            Some(ratio) => output.push_str(&format!("\nFairness ratio: {:.2}\n", ratio)),
            None => output.push_str("\nFairness ratio: n/a\n"),
        }
        output
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Buckets generated sessions by the tier of their topic
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionAnalyzer;

impl DistributionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze a session set against its topic catalog
    ///
    /// Topics without sessions still count toward their tier, and a tier
    /// without topics is reported as a zero-filled bucket.
    ///
    /// # Errors
    /// - `EmptyDistribution` when the catalog is empty
    /// - `UnknownTopic` when a session references a topic not in the catalog
    pub fn analyze(&self, sessions: &[StudySession], topics: &[Topic]) -> SchedulerResult<DistributionReport> {
        if topics.is_empty() {
            return Err(SchedulerError::EmptyDistribution);
        }

        let mut tallies: HashMap<u64, TopicTally> = topics
            .iter()
            .map(|t| (t.id, TopicTally::default()))
            .collect();

        for session in sessions {
            let tally = tallies
                .get_mut(&session.topic_id)
                .ok_or(SchedulerError::UnknownTopic {
                    topic_id: session.topic_id,
                })?;
            tally.sessions += 1;
            tally.hours += session.hours;
            if session.session_type == SessionType::Review {
                tally.reviews += 1;
            }
        }

        let mut grouped: BTreeMap<ComplexityTier, Vec<TopicTally>> = BTreeMap::new();
        for topic in topics {
            if let Some(tally) = tallies.get(&topic.id) {
                grouped.entry(topic.tier).or_default().push(*tally);
            }
        }

        let by_tier: BTreeMap<_, _> = ComplexityTier::all()
            .into_iter()
            .map(|tier| {
                let stats = grouped
                    .get(&tier)
                    .map(|group| bucket_stats(tier, group))
                    .unwrap_or_else(|| ComplexityBucketStats::empty(tier));
                (tier, stats)
            })
            .collect();

        let fairness_ratio = fairness_ratio(by_tier.values());
        let report = DistributionReport {
            total_topics: by_tier.values().map(|b| b.topic_count).sum(),
            total_sessions: by_tier.values().map(|b| b.total_sessions).sum(),
            by_tier,
            fairness_ratio,
        };

        tracing::debug!(
            "Analyzed {} sessions over {} topics (fairness {:?})",
            report.total_sessions,
            report.total_topics,
            report.fairness_ratio
        );
        Ok(report)
    }
}

/// Analyze with a default analyzer
pub fn analyze_distribution(sessions: &[StudySession], topics: &[Topic]) -> SchedulerResult<DistributionReport> {
    DistributionAnalyzer::new().analyze(sessions, topics)
}

fn bucket_stats(tier: ComplexityTier, group: &[TopicTally]) -> ComplexityBucketStats {
    let topic_count = group.len();
    let total_sessions: usize = group.iter().map(|t| t.sessions).sum();
    let counts: Vec<f64> = group.iter().map(|t| t.sessions as f64).collect();

    ComplexityBucketStats {
        tier,
        topic_count,
        total_sessions,
        avg_sessions_per_topic: total_sessions as f64 / topic_count as f64,
        total_hours: group.iter().map(|t| t.hours).sum(),
        min_review_sessions: group.iter().map(|t| t.reviews).min().unwrap_or(0),
        max_review_sessions: group.iter().map(|t| t.reviews).max().unwrap_or(0),
        session_std_dev: counts.iter().population_std_dev(),
    }
}

fn fairness_ratio<'a>(buckets: impl Iterator<Item = &'a ComplexityBucketStats>) -> Option<f64> {
    let averages: Vec<f64> = buckets
        .filter(|b| !b.is_empty())
        .map(|b| b.avg_sessions_per_topic)
        .collect();

    let max = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = averages.iter().copied().fold(f64::INFINITY, f64::min);

    (!averages.is_empty() && min > 0.0).then(|| max / min)
}
