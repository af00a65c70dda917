use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LevelId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LevelError {
    #[error("level title cannot be empty")]
    EmptyTitle,

    #[error("{field} range is empty")]
    EmptyRange { field: &'static str },

    #[error("complement target must be 5 or 10, got {target}")]
    InvalidComplementTarget { target: u32 },

    #[error("complement known part must stay within 0..={target}")]
    ComplementOutOfRange { target: u32 },

    #[error("addition cap must be at least 2, got {max_sum}")]
    InvalidSumCap { max_sum: u32 },

    #[error("comparison levels need at least two distinct operands")]
    ComparisonRangeTooSmall,

    #[error("choice count must be {expected}, got {provided}")]
    InvalidChoiceCount { expected: &'static str, provided: usize },

    #[error("answers {min}..={max} fall outside the display range")]
    AnswerOutsideDisplay { min: u32, max: u32 },

    #[error("display range holds fewer than {needed} values")]
    DisplayRangeTooSmall { needed: usize },

    #[error("{field} range is too large to generate from")]
    Overflow { field: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("a catalog needs between 1 and {max} levels, got {len}")]
    InvalidLength { len: usize, max: usize },

    #[error("level ids must run 1..=N in order; expected {expected}, found {found}")]
    NonContiguous { expected: LevelId, found: LevelId },
}

//
// ─── RULES ─────────────────────────────────────────────────────────────────────
//

/// How a complement question is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplementStyle {
    /// Blocks are drawn and the formula sits underneath.
    Visual,
    /// Only the formula `a + □ = K` is shown.
    Formula,
}

/// Generation rule of a level: one variant per question type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelRule {
    /// Touch each icon to count it.
    TapToCount { range: RangeInclusive<u32> },
    /// Pick the icon group that matches the sample.
    MatchGroup { range: RangeInclusive<u32> },
    /// Count the icons and pick the numeral.
    CountObjects { range: RangeInclusive<u32> },
    /// Fill the gap in a run of four consecutive numbers.
    Sequence { start_range: RangeInclusive<u32> },
    /// Which of two icon groups holds more.
    CompareVisual { range: RangeInclusive<u32> },
    /// Which of two numerals is bigger.
    CompareNumber { range: RangeInclusive<u32> },
    /// `known + □ = target`.
    Complement {
        target: u32,
        range: RangeInclusive<u32>,
        style: ComplementStyle,
    },
    /// Add two icon groups.
    AddVisual {
        a: RangeInclusive<u32>,
        b: RangeInclusive<u32>,
    },
    /// `a + b = ?` with a dot hint available.
    AddWithHint {
        a: RangeInclusive<u32>,
        b: RangeInclusive<u32>,
    },
    /// `a + b = ?` with `a + b <= max_sum` and no carry across the tens digit.
    AddNoCarry { max_sum: u32 },
}

impl LevelRule {
    /// Comparison levels offer exactly their two operands as choices.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            LevelRule::CompareVisual { .. } | LevelRule::CompareNumber { .. }
        )
    }

    /// Smallest and largest answer this rule can produce.
    #[must_use]
    pub fn answer_bounds(&self) -> (u32, u32) {
        match self {
            LevelRule::TapToCount { range }
            | LevelRule::MatchGroup { range }
            | LevelRule::CountObjects { range }
            | LevelRule::CompareVisual { range }
            | LevelRule::CompareNumber { range } => (*range.start(), *range.end()),
            LevelRule::Sequence { start_range } => (
                start_range.start().saturating_add(1),
                start_range.end().saturating_add(2),
            ),
            LevelRule::Complement { target, range, .. } => (
                target.saturating_sub(*range.end()),
                target.saturating_sub(*range.start()),
            ),
            LevelRule::AddVisual { a, b } | LevelRule::AddWithHint { a, b } => (
                a.start().saturating_add(*b.start()),
                a.end().saturating_add(*b.end()),
            ),
            LevelRule::AddNoCarry { max_sum } => (2, *max_sum),
        }
    }

    fn validate(&self) -> Result<(), LevelError> {
        fn non_empty(range: &RangeInclusive<u32>, field: &'static str) -> Result<(), LevelError> {
            if range.is_empty() {
                return Err(LevelError::EmptyRange { field });
            }
            Ok(())
        }

        match self {
            LevelRule::TapToCount { range }
            | LevelRule::MatchGroup { range }
            | LevelRule::CountObjects { range } => non_empty(range, "count"),
            LevelRule::Sequence { start_range } => {
                non_empty(start_range, "start")?;
                // The shown run ends three past the start.
                if start_range.end().checked_add(3).is_none() {
                    return Err(LevelError::Overflow { field: "start" });
                }
                Ok(())
            }
            LevelRule::CompareVisual { range } | LevelRule::CompareNumber { range } => {
                non_empty(range, "operand")?;
                if range.end() == range.start() {
                    return Err(LevelError::ComparisonRangeTooSmall);
                }
                Ok(())
            }
            LevelRule::Complement { target, range, .. } => {
                if *target != 5 && *target != 10 {
                    return Err(LevelError::InvalidComplementTarget { target: *target });
                }
                non_empty(range, "known part")?;
                if range.end() > target {
                    return Err(LevelError::ComplementOutOfRange { target: *target });
                }
                Ok(())
            }
            LevelRule::AddVisual { a, b } | LevelRule::AddWithHint { a, b } => {
                non_empty(a, "first operand")?;
                non_empty(b, "second operand")?;
                if a.end().checked_add(*b.end()).is_none() {
                    return Err(LevelError::Overflow { field: "operand" });
                }
                Ok(())
            }
            LevelRule::AddNoCarry { max_sum } => {
                if *max_sum < 2 {
                    return Err(LevelError::InvalidSumCap { max_sum: *max_sum });
                }
                Ok(())
            }
        }
    }
}

//
// ─── DESCRIPTOR ────────────────────────────────────────────────────────────────
//

/// Static description of one level. Validated on construction, so a
/// descriptor can always generate a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDescriptor {
    id: LevelId,
    title: String,
    label: String,
    description: String,
    rule: LevelRule,
    choice_count: usize,
    display_range: RangeInclusive<u32>,
}

impl LevelDescriptor {
    /// Default range of numbers a choice button may show.
    pub const DEFAULT_DISPLAY_RANGE: RangeInclusive<u32> = 0..=20;

    /// Creates a validated level descriptor.
    ///
    /// # Errors
    ///
    /// Returns `LevelError` if the rule parameters are inconsistent, the
    /// choice count does not fit the rule, or the display range cannot hold
    /// every answer plus its distractors.
    pub fn new(
        id: LevelId,
        title: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        rule: LevelRule,
        choice_count: usize,
        display_range: RangeInclusive<u32>,
    ) -> Result<Self, LevelError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LevelError::EmptyTitle);
        }

        rule.validate()?;

        if rule.is_comparison() {
            if choice_count != 2 {
                return Err(LevelError::InvalidChoiceCount {
                    expected: "2",
                    provided: choice_count,
                });
            }
        } else if !(3..=4).contains(&choice_count) {
            return Err(LevelError::InvalidChoiceCount {
                expected: "3 or 4",
                provided: choice_count,
            });
        }

        let (min, max) = rule.answer_bounds();
        if !display_range.contains(&min) || !display_range.contains(&max) {
            return Err(LevelError::AnswerOutsideDisplay { min, max });
        }
        let span = usize::try_from(display_range.end() - display_range.start())
            .map_or(usize::MAX, |span| span.saturating_add(1));
        if span < choice_count {
            return Err(LevelError::DisplayRangeTooSmall {
                needed: choice_count,
            });
        }

        Ok(Self {
            id,
            title,
            label: label.into(),
            description: description.into(),
            rule,
            choice_count,
            display_range,
        })
    }

    #[must_use]
    pub fn id(&self) -> LevelId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Short label shown on the level map.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn rule(&self) -> &LevelRule {
        &self.rule
    }

    /// Number of answer buttons offered per question.
    #[must_use]
    pub fn choice_count(&self) -> usize {
        self.choice_count
    }

    #[must_use]
    pub fn display_range(&self) -> &RangeInclusive<u32> {
        &self.display_range
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Ordered set of levels with ids `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelDescriptor>,
}

impl LevelCatalog {
    pub const MAX_LEVELS: usize = 12;

    /// Builds a catalog from descriptors ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog is empty, too long, or the ids
    /// are not exactly `1..=N` in order.
    pub fn new(levels: Vec<LevelDescriptor>) -> Result<Self, CatalogError> {
        if levels.is_empty() || levels.len() > Self::MAX_LEVELS {
            return Err(CatalogError::InvalidLength {
                len: levels.len(),
                max: Self::MAX_LEVELS,
            });
        }
        for (index, level) in levels.iter().enumerate() {
            // Bounded by MAX_LEVELS above.
            let expected = LevelId::new(u8::try_from(index + 1).unwrap_or(u8::MAX));
            if level.id() != expected {
                return Err(CatalogError::NonContiguous {
                    expected,
                    found: level.id(),
                });
            }
        }
        Ok(Self { levels })
    }

    /// The twelve-step curriculum: number sense, order and size, composing
    /// five and ten, then first additions.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            levels: standard_levels(),
        }
    }

    #[must_use]
    pub fn get(&self, id: LevelId) -> Option<&LevelDescriptor> {
        let index = usize::from(id.value()).checked_sub(1)?;
        self.levels.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: LevelId) -> bool {
        self.get(id).is_some()
    }

    /// Id of the final level.
    #[must_use]
    pub fn last_level(&self) -> LevelId {
        self.levels
            .last()
            .map_or(LevelId::FIRST, LevelDescriptor::id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.levels.iter()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn level(
    id: u8,
    title: &str,
    label: &str,
    description: &str,
    rule: LevelRule,
    choice_count: usize,
) -> LevelDescriptor {
    LevelDescriptor {
        id: LevelId::new(id),
        title: title.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        rule,
        choice_count,
        display_range: LevelDescriptor::DEFAULT_DISPLAY_RANGE,
    }
}

// Kept in sync with `LevelDescriptor::new` by `standard_catalog_passes_validation`.
fn standard_levels() -> Vec<LevelDescriptor> {
    vec![
        // Step A: number sense
        level(
            1,
            "タッチして数えよう",
            "タッチしてね",
            "え を タッチして かぞえてね",
            LevelRule::TapToCount { range: 1..=5 },
            3,
        ),
        level(
            2,
            "同じ数はどっち？",
            "おなじ かずは？",
            "みほんと おなじ かずは どっち？",
            LevelRule::MatchGroup { range: 1..=5 },
            3,
        ),
        level(
            3,
            "数字を選ぼう",
            "すうじを えらぼう",
            "かずを すうじで こたえてね",
            LevelRule::CountObjects { range: 1..=9 },
            4,
        ),
        // Step B: order and size
        level(
            4,
            "数字の順番",
            "じゅんばん",
            "あいている ところは なにかな？",
            LevelRule::Sequence { start_range: 1..=6 },
            3,
        ),
        level(
            5,
            "どっちが多い？",
            "どっちが おおい？",
            "おおいほうを えらんでね",
            LevelRule::CompareVisual { range: 1..=8 },
            2,
        ),
        level(
            6,
            "どっちが大きい？",
            "どっちが おおきい？",
            "おおきい すうじは どっち？",
            LevelRule::CompareNumber { range: 1..=10 },
            2,
        ),
        // Step C: composing five and ten
        level(
            7,
            "あわせて5 (パズル)",
            "あわせて 5 (パズル)",
            "あと いくつで 5 になる？",
            LevelRule::Complement {
                target: 5,
                range: 1..=4,
                style: ComplementStyle::Visual,
            },
            3,
        ),
        level(
            8,
            "あわせて5 (数式)",
            "あわせて 5 (しき)",
            "2 ＋ □ ＝ 5",
            LevelRule::Complement {
                target: 5,
                range: 1..=4,
                style: ComplementStyle::Formula,
            },
            3,
        ),
        level(
            9,
            "あわせて10",
            "あわせて 10",
            "あと いくつで 10 になる？",
            LevelRule::Complement {
                target: 10,
                range: 1..=9,
                style: ComplementStyle::Visual,
            },
            4,
        ),
        // Step D: first additions
        level(
            10,
            "もの＋もの",
            "あわせると？(え)",
            "あわせると いくつ？",
            LevelRule::AddVisual { a: 1..=4, b: 1..=4 },
            4,
        ),
        level(
            11,
            "ヒントつき 足し算",
            "たしざん (ヒント)",
            "3 ＋ 4 ＝ ？",
            LevelRule::AddWithHint { a: 1..=5, b: 1..=4 },
            4,
        ),
        level(
            12,
            "暗算チャレンジ",
            "あんざん チャレンジ",
            "ぜんぶで いくつ？",
            LevelRule::AddNoCarry { max_sum: 20 },
            4,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(choice_count: usize, display: RangeInclusive<u32>) -> Result<LevelDescriptor, LevelError> {
        LevelDescriptor::new(
            LevelId::new(1),
            "Count",
            "count",
            "count the apples",
            LevelRule::CountObjects { range: 1..=9 },
            choice_count,
            display,
        )
    }

    #[test]
    fn standard_catalog_passes_validation() {
        let catalog = LevelCatalog::standard();
        let rebuilt: Vec<LevelDescriptor> = catalog
            .iter()
            .map(|l| {
                LevelDescriptor::new(
                    l.id(),
                    l.title(),
                    l.label(),
                    l.description(),
                    l.rule().clone(),
                    l.choice_count(),
                    l.display_range().clone(),
                )
                .unwrap()
            })
            .collect();
        let rebuilt = LevelCatalog::new(rebuilt).unwrap();
        assert_eq!(rebuilt, catalog);
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.last_level(), LevelId::new(12));
    }

    #[test]
    fn catalog_lookup_by_id() {
        let catalog = LevelCatalog::standard();
        assert_eq!(catalog.get(LevelId::new(6)).unwrap().label(), "どっちが おおきい？");
        assert!(catalog.get(LevelId::new(0)).is_none());
        assert!(catalog.get(LevelId::new(13)).is_none());
    }

    #[test]
    fn catalog_rejects_gaps() {
        let first = counting(4, 0..=20).unwrap();
        let mut third = first.clone();
        third.id = LevelId::new(3);
        let err = LevelCatalog::new(vec![first, third]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::NonContiguous {
                expected: LevelId::new(2),
                found: LevelId::new(3),
            }
        );
    }

    #[test]
    fn catalog_rejects_empty() {
        assert!(matches!(
            LevelCatalog::new(Vec::new()),
            Err(CatalogError::InvalidLength { len: 0, .. })
        ));
    }

    #[test]
    fn comparison_levels_require_two_choices() {
        let err = LevelDescriptor::new(
            LevelId::new(1),
            "Compare",
            "compare",
            "",
            LevelRule::CompareNumber { range: 1..=10 },
            3,
            0..=20,
        )
        .unwrap_err();
        assert!(matches!(err, LevelError::InvalidChoiceCount { provided: 3, .. }));
    }

    #[test]
    fn comparison_needs_two_distinct_operands() {
        let err = LevelDescriptor::new(
            LevelId::new(1),
            "Compare",
            "compare",
            "",
            LevelRule::CompareVisual { range: 4..=4 },
            2,
            0..=20,
        )
        .unwrap_err();
        assert_eq!(err, LevelError::ComparisonRangeTooSmall);
    }

    #[test]
    fn choice_count_must_be_three_or_four() {
        assert!(counting(2, 0..=20).is_err());
        assert!(counting(5, 0..=20).is_err());
        assert!(counting(3, 0..=20).is_ok());
    }

    #[test]
    fn display_range_must_cover_answers() {
        let err = counting(4, 0..=5).unwrap_err();
        assert_eq!(err, LevelError::AnswerOutsideDisplay { min: 1, max: 9 });
    }

    #[test]
    fn complement_target_is_five_or_ten() {
        let err = LevelDescriptor::new(
            LevelId::new(1),
            "Complement",
            "c",
            "",
            LevelRule::Complement {
                target: 7,
                range: 1..=6,
                style: ComplementStyle::Formula,
            },
            3,
            0..=20,
        )
        .unwrap_err();
        assert_eq!(err, LevelError::InvalidComplementTarget { target: 7 });
    }

    #[test]
    fn answer_bounds_follow_rule() {
        assert_eq!(
            LevelRule::Sequence { start_range: 1..=6 }.answer_bounds(),
            (2, 8)
        );
        assert_eq!(
            LevelRule::Complement {
                target: 10,
                range: 1..=9,
                style: ComplementStyle::Visual
            }
            .answer_bounds(),
            (1, 9)
        );
        assert_eq!(
            LevelRule::AddWithHint { a: 1..=5, b: 1..=4 }.answer_bounds(),
            (2, 9)
        );
    }

    #[test]
    fn ranges_near_u32_max_are_rejected() {
        let near_max = |rule: LevelRule| {
            LevelDescriptor::new(LevelId::new(1), "Big", "b", "", rule, 3, 0..=u32::MAX)
        };

        let err = near_max(LevelRule::Sequence {
            start_range: u32::MAX - 3..=u32::MAX - 2,
        })
        .unwrap_err();
        assert_eq!(err, LevelError::Overflow { field: "start" });

        let err = near_max(LevelRule::AddVisual {
            a: 1..=u32::MAX,
            b: 1..=1,
        })
        .unwrap_err();
        assert_eq!(err, LevelError::Overflow { field: "operand" });

        assert!(near_max(LevelRule::Sequence {
            start_range: u32::MAX - 4..=u32::MAX - 3,
        })
        .is_ok());
    }
}
