use chrono::{DateTime, Duration, Utc};

use crate::models::{Emotion, ReportBucket};

use super::state::{EmotionTotals, Transition};

/// A contiguous stretch of a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Episode {
    pub emotion: Emotion,
    pub start: Duration,
    pub end: Duration,
}

impl Episode {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Read-only view over a finalized session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    session_id: String,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    totals: EmotionTotals,
    final_emotion: Emotion,
    transitions: Vec<Transition>,
}

impl SessionReport {
    pub(crate) fn new(
        session_id: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        totals: EmotionTotals,
        final_emotion: Emotion,
        transitions: Vec<Transition>,
    ) -> Self {
        Self {
            session_id,
            started_at,
            ended_at,
            totals,
            final_emotion,
            transitions,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    pub fn totals(&self) -> &EmotionTotals {
        &self.totals
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn total(&self, emotion: Emotion) -> Duration {
        self.totals.get(emotion)
    }

    pub fn rejection_total(&self) -> Duration {
        self.bucket_total(ReportBucket::Rejection)
    }

    pub fn bucket_total(&self, bucket: ReportBucket) -> Duration {
        bucket
            .emotions()
            .iter()
            .fold(Duration::zero(), |acc, e| acc + self.total(*e))
    }

    pub fn session_total(&self) -> Duration {
        self.ended_at - self.started_at
    }

    /// Offsets (from session start) at which a category of `bucket` ended.
    pub fn bucket_transitions(&self, bucket: ReportBucket) -> Vec<Duration> {
        self.transitions
            .iter()
            .filter(|t| t.ended.bucket() == bucket)
            .map(|t| t.since_start)
            .collect()
    }

    /// Share of the session per bucket, skipping buckets with no time.
    pub fn bucket_shares(&self) -> Vec<(ReportBucket, f64)> {
        let total: i64 = ReportBucket::ALL
            .iter()
            .map(|b| self.bucket_total(*b).num_milliseconds())
            .sum();
        if total <= 0 {
            return Vec::new();
        }
        ReportBucket::ALL
            .iter()
            .filter_map(|bucket| {
                let ms = self.bucket_total(*bucket).num_milliseconds();
                (ms > 0).then(|| (*bucket, ms as f64 / total as f64))
            })
            .collect()
    }

    /// Rebuilds the per-category timeline from the transition log.
    pub fn episodes(&self) -> Vec<Episode> {
        let mut episodes = Vec::with_capacity(self.transitions.len() + 1);
        let mut start = Duration::zero();

        for transition in &self.transitions {
            episodes.push(Episode {
                emotion: transition.ended,
                start,
                end: transition.since_start,
            });
            start = transition.since_start;
        }

        episodes.push(Episode {
            emotion: self.final_emotion,
            start,
            end: self.session_total(),
        });

        episodes.retain(|episode| episode.duration() > Duration::zero());
        episodes
    }
}
