//! Likert recoding of ordinal text responses.
//!
//! Each [`LikertMapping`] is an immutable phrase table keyed by the
//! lower-cased response text. Recoding is total: a phrase outside the table
//! becomes [`Cell::Missing`] so it drops out of every test later on.

use std::fmt;

use itertools::Itertools;
use log::{debug, warn};

use crate::data::{Cell, Table};

const AGREEMENT: &[(&str, u8)] = &[
    ("strongly disagree", 1),
    ("somewhat disagree", 2),
    ("neither agree nor disagree", 3),
    ("somewhat agree", 4),
    ("strongly agree", 5),
];

const DIFFICULTY: &[(&str, u8)] = &[
    ("extremely difficult", 1),
    ("somewhat difficult", 2),
    ("neither easy nor difficult", 3),
    ("somewhat easy", 4),
    ("extremely easy", 5),
];

// Inverted polarity: the most frequent answer scores lowest.
const FREQUENCY: &[(&str, u8)] = &[
    ("always", 1),
    ("most of the time", 2),
    ("about half the time", 3),
    ("sometimes", 4),
    ("never", 5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikertMapping {
    Agreement,
    Difficulty,
    Frequency,
}

impl LikertMapping {
    /// Precedence when several flags are set: agreement, difficulty, frequency.
    pub const PRECEDENCE: [LikertMapping; 3] = [
        LikertMapping::Agreement,
        LikertMapping::Difficulty,
        LikertMapping::Frequency,
    ];

    pub fn from_flags(agreement: bool, difficulty: bool, frequency: bool) -> Option<Self> {
        let requested = Self::PRECEDENCE
            .into_iter()
            .zip([agreement, difficulty, frequency])
            .filter_map(|(mapping, set)| set.then_some(mapping))
            .collect::<Vec<_>>();
        let (chosen, ignored) = requested.split_first()?;
        if !ignored.is_empty() {
            warn!(
                "Multiple Likert mappings requested; using {chosen} and ignoring {}",
                ignored
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Some(*chosen)
    }

    pub fn phrases(self) -> &'static [(&'static str, u8)] {
        match self {
            LikertMapping::Agreement => AGREEMENT,
            LikertMapping::Difficulty => DIFFICULTY,
            LikertMapping::Frequency => FREQUENCY,
        }
    }

    pub fn code(self, response: &str) -> Option<u8> {
        let lowered = response.to_lowercase();
        self.phrases()
            .iter()
            .find(|(phrase, _)| *phrase == lowered)
            .map(|(_, code)| *code)
    }

    pub fn recode(self, cell: &Cell) -> Cell {
        match self.code(&cell.as_display()) {
            Some(code) => Cell::Number(f64::from(code)),
            None => Cell::Missing,
        }
    }
}

impl fmt::Display for LikertMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LikertMapping::Agreement => "agreement",
            LikertMapping::Difficulty => "difficulty",
            LikertMapping::Frequency => "frequency",
        };
        write!(f, "{label}")
    }
}

/// Recodes every cell of the named columns in place and returns how many
/// columns were rewritten. Names absent from the table are skipped and a
/// name listed twice is recoded once.
pub fn normalize_columns<S: AsRef<str>>(
    table: &mut Table,
    columns: &[S],
    mapping: LikertMapping,
) -> usize {
    let mut rewritten = 0;
    for name in columns.iter().map(|name| -> &str { name.as_ref() }).unique() {
        let Some(index) = table.column_index(name) else {
            continue;
        };
        let mut unmatched = 0usize;
        for cell in table.column_mut(index) {
            let recoded = mapping.recode(cell);
            if recoded.is_missing() && !cell.is_missing() {
                unmatched += 1;
            }
            *cell = recoded;
        }
        debug!(
            "Recoded column '{name}' with the {mapping} mapping ({unmatched} unmatched response(s))"
        );
        rewritten += 1;
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phrase_maps_case_insensitively() {
        for mapping in LikertMapping::PRECEDENCE {
            for (phrase, code) in mapping.phrases() {
                assert_eq!(mapping.code(phrase), Some(*code));
                assert_eq!(mapping.code(&phrase.to_uppercase()), Some(*code));
            }
            let codes = mapping.phrases().iter().map(|(_, c)| *c).collect::<Vec<_>>();
            assert_eq!(codes, vec![1, 2, 3, 4, 5]);
        }
        assert_eq!(LikertMapping::Agreement.code("Strongly Agree"), Some(5));
        assert_eq!(LikertMapping::Frequency.code("Never"), Some(5));
        assert_eq!(LikertMapping::Difficulty.code("Extremely difficult"), Some(1));
    }

    #[test]
    fn unrecognized_values_become_missing() {
        let mapping = LikertMapping::Agreement;
        assert_eq!(mapping.recode(&Cell::Text("Agree".into())), Cell::Missing);
        assert_eq!(mapping.recode(&Cell::Text(" strongly agree".into())), Cell::Missing);
        assert_eq!(mapping.recode(&Cell::Number(4.0)), Cell::Missing);
        assert_eq!(mapping.recode(&Cell::Missing), Cell::Missing);
    }

    #[test]
    fn normalize_columns_rewrites_only_present_columns() {
        let mut table = Table::from_columns([
            (
                "Q1",
                vec![
                    Cell::Text("Strongly agree".into()),
                    Cell::Text("somewhat DISAGREE".into()),
                    Cell::Missing,
                ],
            ),
            (
                "Q2",
                vec![
                    Cell::Text("Strongly agree".into()),
                    Cell::Text("Other".into()),
                    Cell::Missing,
                ],
            ),
        ])
        .unwrap();

        let rewritten = normalize_columns(&mut table, &["Q1", "Absent"], LikertMapping::Agreement);

        assert_eq!(rewritten, 1);
        assert_eq!(
            table.column(0),
            [Cell::Number(5.0), Cell::Number(2.0), Cell::Missing]
        );
        assert_eq!(table.column(1)[0], Cell::Text("Strongly agree".into()));
    }

    #[test]
    fn repeated_column_names_are_recoded_once() {
        let mut table = Table::from_columns([(
            "Q1",
            vec![
                Cell::Text("Strongly agree".into()),
                Cell::Text("Somewhat disagree".into()),
            ],
        )])
        .unwrap();

        let rewritten = normalize_columns(&mut table, &["Q1", "Q1"], LikertMapping::Agreement);

        assert_eq!(rewritten, 1);
        assert_eq!(table.column(0), [Cell::Number(5.0), Cell::Number(2.0)]);
    }

    #[test]
    fn from_flags_uses_fixed_precedence() {
        assert_eq!(LikertMapping::from_flags(false, false, false), None);
        assert_eq!(
            LikertMapping::from_flags(false, false, true),
            Some(LikertMapping::Frequency)
        );
        assert_eq!(
            LikertMapping::from_flags(false, true, true),
            Some(LikertMapping::Difficulty)
        );
        assert_eq!(
            LikertMapping::from_flags(true, true, true),
            Some(LikertMapping::Agreement)
        );
    }
}
