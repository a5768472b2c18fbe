use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};

use crate::models::Emotion;

use super::report::SessionReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Finalized,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Running
    }
}

/// Accumulated time per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmotionTotals([Duration; 4]);

impl Default for EmotionTotals {
    fn default() -> Self {
        Self([Duration::zero(); 4])
    }
}

impl EmotionTotals {
    pub fn get(&self, emotion: Emotion) -> Duration {
        self.0[emotion.index()]
    }

    pub fn sum(&self) -> Duration {
        self.0.iter().fold(Duration::zero(), |acc, d| acc + *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, Duration)> + '_ {
        Emotion::ALL.iter().map(move |e| (*e, self.get(*e)))
    }

    fn add(&mut self, emotion: Emotion, elapsed: Duration) {
        self.0[emotion.index()] = self.0[emotion.index()] + elapsed;
    }
}

/// One category change. `ended` is the category that was active until `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub ended: Emotion,
    pub started: Emotion,
    pub at: DateTime<Utc>,
    /// Offset of `at` from the session start.
    pub since_start: Duration,
}

/// Per-session accumulator. Owned by the caller and driven through
/// [`EmotionSession::on_label`] once per frame and [`EmotionSession::finalize`]
/// once at the end.
#[derive(Debug, Clone)]
pub struct EmotionSession {
    id: String,
    status: SessionStatus,
    current: Emotion,
    totals: EmotionTotals,
    started_at: DateTime<Utc>,
    last_transition_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    transitions: Vec<Transition>,
}

impl EmotionSession {
    pub fn begin(id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: SessionStatus::Running,
            current: Emotion::Neutral,
            totals: EmotionTotals::default(),
            started_at,
            last_transition_at: started_at,
            ended_at: None,
            transitions: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current(&self) -> Emotion {
        self.current
    }

    pub fn totals(&self) -> &EmotionTotals {
        &self.totals
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_transition_at(&self) -> DateTime<Utc> {
        self.last_transition_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Time elapsed since the session started, as seen at `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.clamp(now) - self.started_at
    }

    /// Records the label for the current frame. Returns `true` when the label
    /// closed the previous category.
    pub fn on_label(&mut self, label: Emotion, now: DateTime<Utc>) -> Result<bool> {
        if self.status == SessionStatus::Finalized {
            bail!("session {} already finalized", self.id);
        }
        if label == self.current {
            return Ok(false);
        }

        let now = self.clamp(now);
        self.totals.add(self.current, now - self.last_transition_at);
        self.transitions.push(Transition {
            ended: self.current,
            started: label,
            at: now,
            since_start: now - self.started_at,
        });
        self.last_transition_at = now;
        self.current = label;
        Ok(true)
    }

    /// Flushes the open interval and freezes the session.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<SessionReport> {
        if self.status == SessionStatus::Finalized {
            bail!("session {} already finalized", self.id);
        }

        let now = self.clamp(now);
        self.totals.add(self.current, now - self.last_transition_at);
        self.last_transition_at = now;
        self.ended_at = Some(now);
        self.status = SessionStatus::Finalized;
        self.report()
    }

    /// Derived report over the final state.
    pub fn report(&self) -> Result<SessionReport> {
        let Some(ended_at) = self.ended_at else {
            bail!("session {} is still running", self.id);
        };
        Ok(SessionReport::new(
            self.id.clone(),
            self.started_at,
            ended_at,
            self.totals,
            self.current,
            self.transitions.clone(),
        ))
    }

    // Wall clocks can step backwards; never let an interval go negative.
    fn clamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if now < self.last_transition_at {
            log::warn!(
                "clock moved backwards by {}ms in session {}",
                (self.last_transition_at - now).num_milliseconds(),
                self.id
            );
            self.last_transition_at
        } else {
            now
        }
    }
}
