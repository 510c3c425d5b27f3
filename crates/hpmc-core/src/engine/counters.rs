use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// Trial-move tallies. Subtracting two snapshots yields the counts for the interval between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounters {
    pub translate_accept: u64,
    pub translate_reject: u64,
    pub rotate_accept: u64,
    pub rotate_reject: u64,
    pub overlap_checks: u64,
}

impl MoveCounters {
    pub fn move_count(&self) -> u64 {
        self.translate_accept + self.translate_reject + self.rotate_accept + self.rotate_reject
    }

    pub fn translate_acceptance(&self) -> f64 {
        ratio(
            self.translate_accept,
            self.translate_accept + self.translate_reject,
        )
    }

    pub fn rotate_acceptance(&self) -> f64 {
        ratio(self.rotate_accept, self.rotate_accept + self.rotate_reject)
    }

    pub fn record(&mut self, translate: bool, accepted: bool) {
        match (translate, accepted) {
            (true, true) => self.translate_accept += 1,
            (true, false) => self.translate_reject += 1,
            (false, true) => self.rotate_accept += 1,
            (false, false) => self.rotate_reject += 1,
        }
    }
}

fn ratio(numerator: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        numerator as f64 / total as f64
    }
}

impl Add for MoveCounters {
    type Output = MoveCounters;

    fn add(self, rhs: Self) -> Self {
        MoveCounters {
            translate_accept: self.translate_accept + rhs.translate_accept,
            translate_reject: self.translate_reject + rhs.translate_reject,
            rotate_accept: self.rotate_accept + rhs.rotate_accept,
            rotate_reject: self.rotate_reject + rhs.rotate_reject,
            overlap_checks: self.overlap_checks + rhs.overlap_checks,
        }
    }
}

impl AddAssign for MoveCounters {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for MoveCounters {
    type Output = MoveCounters;

    fn sub(self, rhs: Self) -> Self {
        MoveCounters {
            translate_accept: self.translate_accept.saturating_sub(rhs.translate_accept),
            translate_reject: self.translate_reject.saturating_sub(rhs.translate_reject),
            rotate_accept: self.rotate_accept.saturating_sub(rhs.rotate_accept),
            rotate_reject: self.rotate_reject.saturating_sub(rhs.rotate_reject),
            overlap_checks: self.overlap_checks.saturating_sub(rhs.overlap_checks),
        }
    }
}

/// Counters for one completed run together with its wall-clock duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub counters: MoveCounters,
    pub sweeps: u64,
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn moves_per_second(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.counters.move_count() as f64 / seconds
        } else {
            0.0
        }
    }
}
