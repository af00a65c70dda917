//! Plain-text rendering for the terminal front-end.

use std::fmt::Write as _;

use kids_math_core::model::{
    Hint, LevelCatalog, LevelId, LevelState, Question, QuestionBody, UserProfile, Visual,
};
use services::{SessionProgress, SessionResult};

const DOT: &str = "●";
const EMPTY_SLOT: &str = "○";
const STAR: &str = "⭐";
const LOCK: &str = "🔒";

pub fn user_list(users: &[UserProfile]) -> String {
    let mut out = String::from("だれが あそぶ？\n");
    for (index, user) in users.iter().enumerate() {
        let _ = writeln!(out, "  {}. {} ({}さい)", index + 1, user.name(), user.age());
    }
    out.push_str("  n. あたらしく はじめる\n");
    if !users.is_empty() {
        out.push_str("  d <ばんごう>. けす\n");
    }
    out.push_str("  q. おわる");
    out
}

pub fn level_map(catalog: &LevelCatalog, states: &[(LevelId, LevelState)]) -> String {
    let mut out = String::from("レベルを えらんでね\n");
    for level in catalog.iter() {
        let state = states
            .iter()
            .find(|(id, _)| *id == level.id())
            .map_or(LevelState::Locked, |(_, state)| *state);
        let badge = match state {
            LevelState::Locked => LOCK.to_string(),
            LevelState::Unlocked => "   ".to_string(),
            LevelState::Cleared(stars) => STAR.repeat(usize::from(stars.value())),
        };
        let _ = writeln!(
            out,
            "  {:>2}. {:<6} {}  {}",
            level.id().value(),
            badge,
            level.label(),
            level.title()
        );
    }
    out.push_str("  u. ユーザーを かえる\n  q. おわる");
    out
}

pub fn visual(visual: &Visual, body: &QuestionBody) -> Option<String> {
    if visual.is_empty() {
        return None;
    }
    let separator = match body {
        QuestionBody::AddVisual { .. } => "  ＋  ",
        _ => "   |   ",
    };
    Some(
        visual
            .groups
            .iter()
            .map(|count| visual.emoji.repeat(*count as usize))
            .collect::<Vec<_>>()
            .join(separator),
    )
}

pub fn question(question: &Question, progress: SessionProgress) -> String {
    let mut out = format!(
        "もんだい {}/{}\n{}\n",
        progress.answered + 1,
        progress.total,
        question.prompt()
    );
    if let Some(icons) = visual(question.visual(), question.body()) {
        let _ = writeln!(out, "{icons}");
    }
    let choices = question
        .choices()
        .iter()
        .map(|choice| format!("[ {choice} ]"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&choices);
    if question.hint().is_some() {
        out.push_str("\n(h: ヒント  q: やめる)");
    } else {
        out.push_str("\n(q: やめる)");
    }
    out
}

fn dots(count: u32) -> String {
    DOT.repeat(count as usize)
}

pub fn hint(question: &Question) -> Option<String> {
    let hint = question.hint()?;
    let text = match (hint, question.body()) {
        (Hint::CompareDots, QuestionBody::CompareNumber { left, right }) => {
            format!("{left}: {}\n{right}: {}", dots(*left), dots(*right))
        }
        (Hint::TenFrame, QuestionBody::Complement { known, target, .. }) => {
            let missing = target.saturating_sub(*known);
            let cells = format!("{}{}", dots(*known), EMPTY_SLOT.repeat(missing as usize));
            let split = cells
                .chars()
                .collect::<Vec<_>>()
                .chunks(5)
                .map(|row| row.iter().collect::<String>())
                .collect::<Vec<_>>()
                .join("\n");
            format!("{split}\n{EMPTY_SLOT} を かぞえてね")
        }
        (Hint::ComplementDots, QuestionBody::Complement { known, target, .. }) => {
            let missing = target.saturating_sub(*known);
            format!("{}{}", dots(*known), EMPTY_SLOT.repeat(missing as usize))
        }
        (Hint::DotsBelow, QuestionBody::AddWithHint { a, b }) => {
            format!("{a}: {}\n{b}: {}", dots(*a), dots(*b))
        }
        _ => return None,
    };
    Some(text)
}

/// Headline for the result screen.
pub fn result_message(result: &SessionResult) -> String {
    let score = result.score;
    if score.is_perfect() {
        "💮 すごい！ パーフェクト！".to_string()
    } else if score.correct() >= 1 {
        format!("{}もんちゅう {}もん せいかい！", score.total(), score.correct())
    } else {
        "もういちど がんばろう！".to_string()
    }
}

pub fn result(result: &SessionResult) -> String {
    let mut out = result_message(result);
    let stars = usize::from(result.stars.value());
    if stars > 0 {
        let _ = write!(out, "\n{}", STAR.repeat(stars));
    }
    if let Some(level) = result.unlocked {
        let _ = write!(out, "\nレベル {level} が あそべるように なったよ！");
    }
    if !result.persisted {
        out.push_str("\n(きろくを ほぞん できませんでした)");
    }
    out.push_str("\n  r. もういちど");
    if result.next_level.is_some() {
        out.push_str("\n  n. つぎの レベル");
    }
    out.push_str("\n  m. マップに もどる");
    out
}
