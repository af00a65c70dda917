use serde::{Deserialize, Serialize};

use crate::model::ids::LevelId;
use crate::model::level::ComplementStyle;

/// Drawn operands of a question, one variant per question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    TapToCount { count: u32 },
    MatchGroup { count: u32 },
    CountObjects { count: u32 },
    /// Four consecutive numbers with exactly one hidden term.
    Sequence { terms: [Option<u32>; 4] },
    CompareVisual { left: u32, right: u32 },
    CompareNumber { left: u32, right: u32 },
    Complement {
        target: u32,
        known: u32,
        style: ComplementStyle,
    },
    AddVisual { a: u32, b: u32 },
    AddWithHint { a: u32, b: u32 },
    AddNoCarry { a: u32, b: u32 },
}

/// Optional helper the presentation layer can reveal on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    /// Both numbers drawn as apple groups side by side.
    CompareDots,
    /// Dots for the missing part of five.
    ComplementDots,
    /// A ten-frame with the known part filled.
    TenFrame,
    /// Dots under each addend.
    DotsBelow,
}

/// Icon multiset rendered with the prompt: each group is `count` copies of `emoji`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visual {
    pub emoji: String,
    pub groups: Vec<u32>,
}

impl Visual {
    #[must_use]
    pub fn none() -> Self {
        Self {
            emoji: String::new(),
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn single(emoji: impl Into<String>, count: u32) -> Self {
        Self {
            emoji: emoji.into(),
            groups: vec![count],
        }
    }

    #[must_use]
    pub fn pair(emoji: impl Into<String>, left: u32, right: u32) -> Self {
        Self {
            emoji: emoji.into(),
            groups: vec![left, right],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of icons across all groups.
    #[must_use]
    pub fn icon_count(&self) -> u32 {
        self.groups.iter().sum()
    }
}

/// One generated problem. Immutable once produced.
///
/// Serializable for logging and export; there is no `Deserialize`, so the
/// only way to obtain one is the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    level_id: LevelId,
    body: QuestionBody,
    prompt: String,
    visual: Visual,
    answer: u32,
    choices: Vec<u32>,
    hint: Option<Hint>,
}

impl Question {
    /// Assembles a question. Only the generator builds these, after it has
    /// established the choice invariants.
    pub(crate) fn new(
        level_id: LevelId,
        body: QuestionBody,
        prompt: String,
        visual: Visual,
        answer: u32,
        choices: Vec<u32>,
        hint: Option<Hint>,
    ) -> Self {
        debug_assert!(choices.iter().filter(|c| **c == answer).count() == 1);
        Self {
            level_id,
            body,
            prompt,
            visual,
            answer,
            choices,
            hint,
        }
    }

    #[must_use]
    pub fn level_id(&self) -> LevelId {
        self.level_id
    }

    #[must_use]
    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    #[must_use]
    pub fn answer(&self) -> u32 {
        self.answer
    }

    /// Answer buttons in display order. Distinct, contains the answer once.
    #[must_use]
    pub fn choices(&self) -> &[u32] {
        &self.choices
    }

    #[must_use]
    pub fn hint(&self) -> Option<Hint> {
        self.hint
    }

    /// Choices are drawn as icon groups instead of numerals.
    #[must_use]
    pub fn visual_choices(&self) -> bool {
        matches!(
            self.body,
            QuestionBody::MatchGroup { .. } | QuestionBody::CompareVisual { .. }
        )
    }

    #[must_use]
    pub fn is_correct(&self, value: u32) -> bool {
        value == self.answer
    }
}
