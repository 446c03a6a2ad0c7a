// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Fixed cyclic tables for the ten Heavenly Stems and twelve Earthly Branches.
//
// Both tables are indexed 0-based in cycle order. Romanization follows the
// Korean readings used by the profile data ("gap", "eul", ... / "ja", "chuk", ...).

use std::fmt;

use serde::Serialize;

/// Yin/Yang polarity of a Heavenly Stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Polarity {
    Yang,
    Yin,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Yang => "Yang",
            Polarity::Yin => "Yin",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the five elements carried by a Heavenly Stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub fn as_str(self) -> &'static str {
        match self {
            Element::Wood => "Wood",
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Metal => "Metal",
            Element::Water => "Water",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Heavenly Stem.
#[derive(Debug, PartialEq, Eq)]
pub struct Stem {
    /// Lowercase slug used in pillar keys, e.g. "gye".
    pub key: &'static str,
    /// Display form, e.g. "Gye".
    pub label: &'static str,
    pub polarity: Polarity,
    pub element: Element,
}

impl Stem {
    /// Descriptive form, e.g. "Gye (Yin Water)".
    pub fn describe(&self) -> String {
        format!("{} ({} {})", self.label, self.polarity, self.element)
    }
}

/// An Earthly Branch.
#[derive(Debug, PartialEq, Eq)]
pub struct Branch {
    /// Lowercase slug used in pillar keys, e.g. "sa".
    pub key: &'static str,
    /// Display form, e.g. "Sa".
    pub label: &'static str,
    pub animal: &'static str,
}

impl Branch {
    /// Descriptive form, e.g. "Sa (Snake)".
    pub fn describe(&self) -> String {
        format!("{} ({})", self.label, self.animal)
    }
}

pub const STEM_COUNT: usize = 10;
pub const BRANCH_COUNT: usize = 12;

pub static STEMS: [Stem; STEM_COUNT] = [
    Stem { key: "gap", label: "Gap", polarity: Polarity::Yang, element: Element::Wood },
    Stem { key: "eul", label: "Eul", polarity: Polarity::Yin, element: Element::Wood },
    Stem { key: "byeong", label: "Byeong", polarity: Polarity::Yang, element: Element::Fire },
    Stem { key: "jeong", label: "Jeong", polarity: Polarity::Yin, element: Element::Fire },
    Stem { key: "mu", label: "Mu", polarity: Polarity::Yang, element: Element::Earth },
    Stem { key: "gi", label: "Gi", polarity: Polarity::Yin, element: Element::Earth },
    Stem { key: "gyeong", label: "Gyeong", polarity: Polarity::Yang, element: Element::Metal },
    Stem { key: "sin", label: "Sin", polarity: Polarity::Yin, element: Element::Metal },
    Stem { key: "im", label: "Im", polarity: Polarity::Yang, element: Element::Water },
    Stem { key: "gye", label: "Gye", polarity: Polarity::Yin, element: Element::Water },
];

pub static BRANCHES: [Branch; BRANCH_COUNT] = [
    Branch { key: "ja", label: "Ja", animal: "Rat" },
    Branch { key: "chuk", label: "Chuk", animal: "Ox" },
    Branch { key: "in", label: "In", animal: "Tiger" },
    Branch { key: "myo", label: "Myo", animal: "Rabbit" },
    Branch { key: "jin", label: "Jin", animal: "Dragon" },
    Branch { key: "sa", label: "Sa", animal: "Snake" },
    Branch { key: "o", label: "O", animal: "Horse" },
    Branch { key: "mi", label: "Mi", animal: "Goat" },
    Branch { key: "sin", label: "Sin", animal: "Monkey" },
    Branch { key: "yu", label: "Yu", animal: "Rooster" },
    Branch { key: "sul", label: "Sul", animal: "Dog" },
    Branch { key: "hae", label: "Hae", animal: "Pig" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_alternate_polarity_starting_with_yang() {
        for (i, stem) in STEMS.iter().enumerate() {
            let expected = if i % 2 == 0 { Polarity::Yang } else { Polarity::Yin };
            assert_eq!(stem.polarity, expected, "stem {} polarity", stem.key);
        }
    }

    #[test]
    fn stems_pair_up_by_element() {
        for pair in STEMS.chunks(2) {
            assert_eq!(pair[0].element, pair[1].element);
        }
    }

    #[test]
    fn describe_embeds_attributes() {
        assert_eq!(STEMS[9].describe(), "Gye (Yin Water)");
        assert_eq!(BRANCHES[5].describe(), "Sa (Snake)");
    }
}
