use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use thiserror::Error;

use crate::model::{
    ComplementStyle, Hint, LevelCatalog, LevelDescriptor, LevelId, LevelRule, Question,
    QuestionBody, Visual,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("unknown level {0}")]
    UnknownLevel(LevelId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChoiceError {
    #[error("choice range {min}..={max} is empty")]
    EmptyRange { min: u32, max: u32 },

    #[error("correct answer {correct} is outside {min}..={max}")]
    CorrectOutOfRange { correct: u32, min: u32, max: u32 },

    #[error("cannot pick {count} distinct choices from {min}..={max}")]
    InvalidCount { count: usize, min: u32, max: u32 },
}

//
// ─── THEMES ────────────────────────────────────────────────────────────────────
//

struct Theme {
    emoji: &'static str,
    tap_prompt: &'static str,
}

const TAP_THEMES: [Theme; 5] = [
    Theme {
        emoji: "🍎",
        tap_prompt: "りんごを タッチしてね",
    },
    Theme {
        emoji: "🐶",
        tap_prompt: "いぬを タッチしてね",
    },
    Theme {
        emoji: "🚗",
        tap_prompt: "くるまを タッチしてね",
    },
    Theme {
        emoji: "🐸",
        tap_prompt: "かえるを タッチしてね",
    },
    Theme {
        emoji: "⚽️",
        tap_prompt: "ボールを タッチしてね",
    },
];

const ICONS: [&str; 8] = ["🍎", "🐶", "🚗", "🐸", "⚽️", "🐱", "🚙", "⭐️"];

const COMPARE_ICON: &str = "🍎";
const BLOCK_ICON: &str = "■";

/// Redraw budget for rejection-sampled operands before the constructive fallback.
const MAX_REDRAWS: usize = 64;

/// Offsets tried around the correct answer before falling back to random fill.
const NEAR_OFFSETS: [i64; 4] = [-2, -1, 1, 2];

//
// ─── GENERATION ────────────────────────────────────────────────────────────────
//

/// Generates one question for `level`, drawing every random value from `rng`.
///
/// Generation cannot fail: the descriptor was validated when it was built.
pub fn generate<R: Rng + ?Sized>(level: &LevelDescriptor, rng: &mut R) -> Question {
    let id = level.id();
    let display = level.display_range();
    let count = level.choice_count();

    match level.rule() {
        LevelRule::TapToCount { range } => {
            let value = draw(range, rng);
            let theme = TAP_THEMES.choose(rng).unwrap_or(&TAP_THEMES[0]);
            Question::new(
                id,
                QuestionBody::TapToCount { count: value },
                theme.tap_prompt.to_string(),
                Visual::single(theme.emoji, value),
                value,
                fill_choices(value, display, count, rng),
                None,
            )
        }
        LevelRule::MatchGroup { range } => {
            let value = draw(range, rng);
            Question::new(
                id,
                QuestionBody::MatchGroup { count: value },
                "したと おなじ かずは？".to_string(),
                Visual::single(pick_icon(rng), value),
                value,
                fill_choices(value, display, count, rng),
                None,
            )
        }
        LevelRule::CountObjects { range } => {
            let value = draw(range, rng);
            Question::new(
                id,
                QuestionBody::CountObjects { count: value },
                "いくつ あるかな？".to_string(),
                Visual::single(pick_icon(rng), value),
                value,
                fill_choices(value, display, count, rng),
                None,
            )
        }
        LevelRule::Sequence { start_range } => {
            let start = draw(start_range, rng);
            let hidden = rng.random_range(1..=2_usize);
            let mut terms = [Some(start), Some(start + 1), Some(start + 2), Some(start + 3)];
            let answer = start + u32::try_from(hidden).unwrap_or(1);
            terms[hidden] = None;
            let rendered = terms
                .iter()
                .map(|term| term.map_or_else(|| "□".to_string(), |n| n.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            Question::new(
                id,
                QuestionBody::Sequence { terms },
                format!("□ にはいるのは なに？\n{rendered}"),
                Visual::none(),
                answer,
                fill_choices(answer, display, count, rng),
                None,
            )
        }
        LevelRule::CompareVisual { range } => {
            let (left, right) = distinct_pair(range, rng);
            Question::new(
                id,
                QuestionBody::CompareVisual { left, right },
                "どっちが おおい？".to_string(),
                Visual::pair(COMPARE_ICON, left, right),
                left.max(right),
                vec![left, right],
                None,
            )
        }
        LevelRule::CompareNumber { range } => {
            let (left, right) = distinct_pair(range, rng);
            Question::new(
                id,
                QuestionBody::CompareNumber { left, right },
                "おおきい すうじは？".to_string(),
                Visual::none(),
                left.max(right),
                vec![left, right],
                Some(Hint::CompareDots),
            )
        }
        LevelRule::Complement {
            target,
            range,
            style,
        } => {
            let known = draw(range, rng);
            let answer = target - known;
            let formula = format!("{known} ＋ □ ＝ {target}");
            let (prompt, visual) = match style {
                ComplementStyle::Visual if *target == 5 => (
                    format!("■が {known}こ あります。\nあと いくつで 5こ？\n{formula}"),
                    Visual::single(BLOCK_ICON, known),
                ),
                ComplementStyle::Visual => (
                    format!("{known} が あります。\nあと いくつで {target} ？\n{formula}"),
                    Visual::single(BLOCK_ICON, known),
                ),
                ComplementStyle::Formula => (formula, Visual::none()),
            };
            let hint = if *target == 10 {
                Hint::TenFrame
            } else {
                Hint::ComplementDots
            };
            Question::new(
                id,
                QuestionBody::Complement {
                    target: *target,
                    known,
                    style: *style,
                },
                prompt,
                visual,
                answer,
                fill_choices(answer, display, count, rng),
                Some(hint),
            )
        }
        LevelRule::AddVisual { a, b } => {
            let (a, b) = (draw(a, rng), draw(b, rng));
            Question::new(
                id,
                QuestionBody::AddVisual { a, b },
                "あわせると いくつ？".to_string(),
                Visual::pair(pick_icon(rng), a, b),
                a + b,
                fill_choices(a + b, display, count, rng),
                None,
            )
        }
        LevelRule::AddWithHint { a, b } => {
            let (a, b) = (draw(a, rng), draw(b, rng));
            Question::new(
                id,
                QuestionBody::AddWithHint { a, b },
                format!("{a} ＋ {b} ＝ ？"),
                Visual::none(),
                a + b,
                fill_choices(a + b, display, count, rng),
                Some(Hint::DotsBelow),
            )
        }
        LevelRule::AddNoCarry { max_sum } => {
            let (a, b) = no_carry_pair(*max_sum, rng);
            Question::new(
                id,
                QuestionBody::AddNoCarry { a, b },
                format!("{a} ＋ {b} ＝ ？"),
                Visual::none(),
                a + b,
                fill_choices(a + b, display, count, rng),
                None,
            )
        }
    }
}

/// Looks `id` up in `catalog` and generates a question for it.
///
/// # Errors
///
/// Returns `GenerateError::UnknownLevel` if the catalog has no such level.
pub fn generate_for<R: Rng + ?Sized>(
    catalog: &LevelCatalog,
    id: LevelId,
    rng: &mut R,
) -> Result<Question, GenerateError> {
    let level = catalog.get(id).ok_or(GenerateError::UnknownLevel(id))?;
    Ok(generate(level, rng))
}

/// Builds `count` distinct answer choices in `min..=max` that include `correct`.
///
/// Values next to the answer (±1, ±2, clamped into range) are preferred as
/// distractors; the rest is filled uniformly. The result is shuffled, so
/// position says nothing about correctness.
///
/// # Errors
///
/// Returns `ChoiceError` if the range is empty, `correct` lies outside it,
/// `count` is zero, or the range holds fewer than `count` values.
pub fn generate_choices<R: Rng + ?Sized>(
    correct: u32,
    min: u32,
    max: u32,
    count: usize,
    rng: &mut R,
) -> Result<Vec<u32>, ChoiceError> {
    if min > max {
        return Err(ChoiceError::EmptyRange { min, max });
    }
    if !(min..=max).contains(&correct) {
        return Err(ChoiceError::CorrectOutOfRange { correct, min, max });
    }
    if count == 0 || span(&(min..=max)) < count {
        return Err(ChoiceError::InvalidCount { count, min, max });
    }
    Ok(fill_choices(correct, &(min..=max), count, rng))
}

// Callers guarantee `correct` is in range; `count` is capped by the range size.
fn fill_choices<R: Rng + ?Sized>(
    correct: u32,
    range: &RangeInclusive<u32>,
    count: usize,
    rng: &mut R,
) -> Vec<u32> {
    let (min, max) = (*range.start(), *range.end());
    let target = count.min(span(range));

    let mut choices = Vec::with_capacity(target);
    choices.push(correct);

    let mut offsets = NEAR_OFFSETS;
    offsets.shuffle(rng);
    for offset in offsets {
        if choices.len() >= target {
            break;
        }
        let near = (i64::from(correct) + offset).clamp(i64::from(min), i64::from(max));
        let near = u32::try_from(near).unwrap_or(correct);
        if !choices.contains(&near) {
            choices.push(near);
        }
    }

    let mut attempts = 0;
    while choices.len() < target && attempts < MAX_REDRAWS {
        attempts += 1;
        let candidate = rng.random_range(min..=max);
        if !choices.contains(&candidate) {
            choices.push(candidate);
        }
    }
    // Sweep whatever is left so the count is always met.
    let mut candidate = min;
    while choices.len() < target && candidate <= max {
        if !choices.contains(&candidate) {
            choices.push(candidate);
        }
        match candidate.checked_add(1) {
            Some(next) => candidate = next,
            None => break,
        }
    }

    choices.shuffle(rng);
    choices
}

fn span(range: &RangeInclusive<u32>) -> usize {
    if range.is_empty() {
        return 0;
    }
    usize::try_from(range.end() - range.start()).map_or(usize::MAX, |s| s.saturating_add(1))
}

fn draw<R: Rng + ?Sized>(range: &RangeInclusive<u32>, rng: &mut R) -> u32 {
    rng.random_range(range.clone())
}

fn pick_icon<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    ICONS.choose(rng).copied().unwrap_or(COMPARE_ICON)
}

/// Two different operands from `range`, which holds at least two values.
fn distinct_pair<R: Rng + ?Sized>(range: &RangeInclusive<u32>, rng: &mut R) -> (u32, u32) {
    let left = draw(range, rng);
    for _ in 0..MAX_REDRAWS {
        let right = draw(range, rng);
        if right != left {
            return (left, right);
        }
    }
    let right = if left < *range.end() { left + 1 } else { left - 1 };
    (left, right)
}

/// `a, b >= 1`, `a + b <= max_sum`, and the units digits do not carry.
fn no_carry_pair<R: Rng + ?Sized>(max_sum: u32, rng: &mut R) -> (u32, u32) {
    let operand = 1..=max_sum - 1;
    for _ in 0..MAX_REDRAWS {
        let a = draw(&operand, rng);
        let b = draw(&operand, rng);
        if b <= max_sum - a && a % 10 + b % 10 < 10 {
            return (a, b);
        }
    }
    // Satisfies the constraint by construction: a <= 8 and b = 1.
    let a = rng.random_range(1..=(max_sum - 1).min(8));
    (a, 1)
}
