// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Day-pillar (Ganji) calculator
//
// Converts a Gregorian birth date/time into a Julian Day Number, applies the
// Zi-hour day boundary (23:00 starts the next day) and derives the stem and
// branch of the sexagenary day cycle.
//
// The engine is a pure function over a structurally valid date. Range and
// days-in-month checks live in `validate`; an impossible date (Feb 30) fed
// directly to `compute_day_pillar` yields a meaningless pillar, not an error.

mod tables;
mod validate;

pub use tables::{Branch, Element, Polarity, Stem, BRANCHES, BRANCH_COUNT, STEMS, STEM_COUNT};
pub use validate::{days_in_month, is_leap_year, BirthForm, BirthFormErrors, Field, YEAR_RANGE};

use serde::Serialize;

/// Number of distinct day pillars (lcm of 10 and 12).
pub const CYCLE_LENGTH: usize = 60;

/// Minute of the day at which the Zi hour begins (23:00).
pub const ZI_HOUR_START_MINUTE: u32 = 23 * 60;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Time of birth. Hour and minute only exist as a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthTime {
    pub hour: u32,
    pub minute: u32,
}

impl BirthTime {
    fn minute_of_day(self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Whether this time falls in the Zi hour that opens the next day.
    pub fn is_late_zi_hour(self) -> bool {
        self.minute_of_day() >= ZI_HOUR_START_MINUTE
    }
}

/// A structurally valid birth date with an optional time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthInput {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    /// 1..=31, valid for the month
    pub day: u32,
    /// `None` means the time is unknown; it is treated as a daytime birth.
    pub time: Option<BirthTime>,
}

impl BirthInput {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            time: None,
        }
    }

    pub fn at(mut self, hour: u32, minute: u32) -> Self {
        self.time = Some(BirthTime { hour, minute });
        self
    }
}

/// The day pillar as presented to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ganji {
    /// Lookup slug, e.g. "gye-sa".
    pub key: String,
    /// Display form, e.g. "Gye-Sa".
    pub label: String,
    /// e.g. "Gye (Yin Water)".
    pub stem: String,
    /// e.g. "Sa (Snake)".
    pub branch: String,
}

/// A (stem, branch) pair of the sexagenary cycle.
///
/// Only the 60 pairs with matching parity exist; constructors never produce
/// the other 60 combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pillar {
    stem_index: usize,
    branch_index: usize,
}

impl Pillar {
    /// Pillar at position `n` of the cycle (0 = gap-ja). Wraps modulo 60.
    pub fn from_cycle_index(n: usize) -> Self {
        let n = n % CYCLE_LENGTH;
        Self {
            stem_index: n % STEM_COUNT,
            branch_index: n % BRANCH_COUNT,
        }
    }

    /// Pillar of the day with the given Julian Day Number.
    pub fn from_jdn(jdn: i64) -> Self {
        Self {
            stem_index: stem_index(jdn),
            branch_index: branch_index(jdn),
        }
    }

    pub fn stem_index(&self) -> usize {
        self.stem_index
    }

    pub fn branch_index(&self) -> usize {
        self.branch_index
    }

    /// Position in the 60-cycle: the unique n with n ≡ stem (mod 10) and
    /// n ≡ branch (mod 12).
    pub fn cycle_index(&self) -> usize {
        let s = self.stem_index as i64;
        let b = self.branch_index as i64;
        (6 * s - 5 * b).rem_euclid(CYCLE_LENGTH as i64) as usize
    }

    pub fn stem(&self) -> &'static Stem {
        &STEMS[self.stem_index]
    }

    pub fn branch(&self) -> &'static Branch {
        &BRANCHES[self.branch_index]
    }

    /// The following pillar in the cycle.
    pub fn next(&self) -> Self {
        Self::from_cycle_index(self.cycle_index() + 1)
    }

    pub fn key(&self) -> String {
        format!("{}-{}", self.stem().key, self.branch().key)
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.stem().label, self.branch().label)
    }

    pub fn ganji(&self) -> Ganji {
        Ganji {
            key: self.key(),
            label: self.label(),
            stem: self.stem().describe(),
            branch: self.branch().describe(),
        }
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Julian Day Number of a proleptic-Gregorian date (Fliegel–Van Flandern).
///
/// Exact integer arithmetic; floor division is Euclidean so the formula
/// stays correct for years before -4800 as well.
pub fn julian_day_number(year: i32, month: u32, day: u32) -> i64 {
    let y = year as i64;
    let m = month as i64;
    let d = day as i64;

    let a = (14 - m).div_euclid(12);
    let y2 = y + 4800 - a;
    let m2 = m + 12 * a - 3;

    d + (153 * m2 + 2).div_euclid(5) + 365 * y2 + y2.div_euclid(4) - y2.div_euclid(100)
        + y2.div_euclid(400)
        - 32045
}

/// JDN of the calendar day the pillar is read from, after the Zi-hour shift.
///
/// A birth at or after 23:00 belongs to the next day. Without a time no
/// shift is applied.
pub fn effective_jdn(input: &BirthInput) -> i64 {
    let jdn = julian_day_number(input.year, input.month, input.day);
    match input.time {
        Some(t) if t.is_late_zi_hour() => jdn + 1,
        _ => jdn,
    }
}

/// Stem index 0..=9 for a JDN.
pub fn stem_index(jdn: i64) -> usize {
    (jdn - 1).rem_euclid(STEM_COUNT as i64) as usize
}

/// Branch index 0..=11 for a JDN.
pub fn branch_index(jdn: i64) -> usize {
    (jdn + 1).rem_euclid(BRANCH_COUNT as i64) as usize
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

/// Day pillar of a birth as a structured [`Pillar`].
pub fn day_pillar(input: &BirthInput) -> Pillar {
    Pillar::from_jdn(effective_jdn(input))
}

/// Day pillar of a birth in its presentation form.
pub fn compute_day_pillar(input: &BirthInput) -> Ganji {
    day_pillar(input).ganji()
}

/// All 60 pillars in cycle order, starting at gap-ja.
pub fn sexagenary_cycle() -> impl Iterator<Item = Pillar> {
    (0..CYCLE_LENGTH).map(Pillar::from_cycle_index)
}
