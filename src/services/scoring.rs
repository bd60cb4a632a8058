// src/services/scoring.rs

//! Per-answer grading. Pure functions, no store access.

/// Points awarded for an exact match with the canonical answer.
pub const POINTS_RIGHT: i32 = 4;
/// Points for any other non-empty answer.
pub const POINTS_WRONG: i32 = -2;
pub const POINTS_NOT_ANSWERED: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Right,
    Wrong,
    NotAnswered,
}

impl Verdict {
    pub fn points(self) -> i32 {
        match self {
            Verdict::Right => POINTS_RIGHT,
            Verdict::Wrong => POINTS_WRONG,
            Verdict::NotAnswered => POINTS_NOT_ANSWERED,
        }
    }
}

/// Grades one submitted answer against the canonical one.
///
/// Comparison is byte-exact: no trimming, no case folding. An empty
/// submission is always "not answered", whatever the canonical answer is.
pub fn score_answer(canonical: &str, submitted: &str) -> Verdict {
    if submitted.is_empty() {
        Verdict::NotAnswered
    } else if submitted == canonical {
        Verdict::Right
    } else {
        Verdict::Wrong
    }
}

/// Running totals over a batch of verdicts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub right: i32,
    pub wrong: i32,
    pub not_answered: i32,
    pub points: i32,
}

impl Tally {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Right => self.right += 1,
            Verdict::Wrong => self.wrong += 1,
            Verdict::NotAnswered => self.not_answered += 1,
        }
        self.points += verdict.points();
    }

    pub fn answered(&self) -> i32 {
        self.right + self.wrong + self.not_answered
    }
}

impl FromIterator<Verdict> for Tally {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for verdict in iter {
            tally.record(verdict);
        }
        tally
    }
}
