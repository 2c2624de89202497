//! Hierarchy ranks and title-based rank inference.
//!
//! Two scales exist. [`RankScale::Standard`] is the canonical eight-level
//! scale; [`RankScale::Legacy`] is the five-level scale used by the first
//! generation of the directory. Inference always produces a standard rank
//! and is then projected onto the active scale.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Scale ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RankScale {
  /// 1 top leadership … 8 assistants.
  #[default]
  Standard,
  /// 1 senior leadership … 5 assistants.
  Legacy,
}

const STANDARD_LABELS: [&str; 8] = [
  "Высшее руководство (ГД)",
  "Первые заместители",
  "Заместители",
  "Руководители центров",
  "Руководители управлений",
  "Руководители отделов",
  "Специалисты",
  "Ассистенты",
];

const LEGACY_LABELS: [&str; 5] = [
  "Высшее руководство",
  "Руководство",
  "Менеджеры",
  "Специалисты",
  "Ассистенты",
];

impl RankScale {
  /// The most junior rank; ranks run `1..=max()`.
  pub fn max(self) -> u8 {
    match self {
      Self::Standard => 8,
      Self::Legacy => 5,
    }
  }

  /// Rank assigned when a row carries no usable value.
  pub fn default_rank(self) -> u8 {
    match self {
      Self::Standard => 7,
      Self::Legacy => 3,
    }
  }

  pub fn clamp(self, rank: i64) -> u8 {
    // Bounded by `max()`, so the narrowing cast cannot truncate.
    rank.clamp(1, i64::from(self.max())) as u8
  }

  pub fn contains(self, rank: u8) -> bool { (1..=self.max()).contains(&rank) }

  /// Human-readable label, or `None` for a rank outside the scale.
  pub fn label(self, rank: u8) -> Option<&'static str> {
    let labels: &[&str] = match self {
      Self::Standard => &STANDARD_LABELS,
      Self::Legacy => &LEGACY_LABELS,
    };
    labels.get(usize::from(rank).checked_sub(1)?).copied()
  }

  /// Project a standard-scale rank onto this scale.
  pub fn from_standard(self, rank: u8) -> u8 {
    match self {
      Self::Standard => Self::Standard.clamp(i64::from(rank)),
      Self::Legacy => match rank {
        0 | 1 => 1,
        2 | 3 => 2,
        4..=6 => 3,
        7 => 4,
        _ => 5,
      },
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Standard => "standard",
      Self::Legacy => "legacy",
    }
  }
}

impl fmt::Display for RankScale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RankScale {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "standard" | "8" => Ok(Self::Standard),
      "legacy" | "5" => Ok(Self::Legacy),
      other => Err(Error::UnknownScale(other.to_owned())),
    }
  }
}

// ─── Inference rules ─────────────────────────────────────────────────────────

/// How a keyword is matched against a lowercased title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
  /// Substring anywhere in the title.
  Phrase(&'static str),
  /// A whole token; tokens are split on anything that is not alphanumeric.
  Word(&'static str),
}

impl Keyword {
  fn matches(self, title: &str, tokens: &[&str]) -> bool {
    match self {
      Self::Phrase(p) => title.contains(p),
      Self::Word(w) => tokens.contains(&w),
    }
  }
}

/// One step of the inference cascade: the rule fires when any keyword
/// matches and no exclusion does.
#[derive(Debug, Clone, Copy)]
pub struct RankRule {
  pub rank:    u8,
  pub any_of:  &'static [Keyword],
  pub none_of: &'static [Keyword],
}

impl RankRule {
  pub fn matches(&self, title: &str, tokens: &[&str]) -> bool {
    self.any_of.iter().any(|k| k.matches(title, tokens))
      && !self.none_of.iter().any(|k| k.matches(title, tokens))
  }
}

use Keyword::{Phrase, Word};

/// Rank assigned when no rule matches.
pub const FALLBACK_RANK: u8 = 8;

/// Deputies are never top leadership.
const DEPUTY: &[Keyword] = &[
  Phrase("заместител"),
  Word("зам"),
  Word("вице"),
  Phrase("deputy"),
  Word("vice"),
];

/// A plain "director" naming a deputy or a sub-unit is not top leadership;
/// the unit rules below place it instead.
const NOT_TOP_LEADERSHIP: &[Keyword] = &[
  Phrase("заместител"),
  Word("зам"),
  Word("вице"),
  Phrase("deputy"),
  Word("vice"),
  Phrase("департамент"),
  Phrase("центр"),
  Phrase("управлени"),
  Phrase("дирекци"),
  Phrase("отдел"),
  Phrase("служб"),
  Phrase("department"),
  Phrase("center"),
  Phrase("centre"),
  Phrase("division"),
  Phrase("directorate"),
  Word("unit"),
  Word("service"),
];

/// The inference cascade on the standard scale, evaluated top to bottom.
pub const RANK_RULES: &[RankRule] = &[
  RankRule {
    rank:    1,
    any_of:  &[
      Phrase("генеральный директор"),
      Word("гд"),
      Phrase("general director"),
      Word("ceo"),
    ],
    none_of: DEPUTY,
  },
  RankRule {
    rank:    1,
    any_of:  &[Word("директор"), Word("director")],
    none_of: NOT_TOP_LEADERSHIP,
  },
  RankRule {
    rank:    2,
    any_of:  &[
      Phrase("первый заместитель"),
      Phrase("1-й зам"),
      Phrase("first deputy"),
    ],
    none_of: &[],
  },
  RankRule {
    rank:    3,
    any_of:  &[
      Phrase("заместител"),
      Word("зам"),
      Word("вице"),
      Phrase("deputy"),
      Word("vice"),
    ],
    none_of: &[],
  },
  RankRule {
    rank:    4,
    any_of:  &[
      Phrase("руководитель центра"),
      Phrase("директор центра"),
      Phrase("директор департамента"),
      Phrase("начальник департамента"),
      Phrase("head of center"),
      Phrase("head of centre"),
      Phrase("director of center"),
      Phrase("director of centre"),
      Phrase("department director"),
      Phrase("director of department"),
    ],
    none_of: &[],
  },
  RankRule {
    rank:    5,
    any_of:  &[
      Phrase("руководитель управления"),
      Phrase("начальник управления"),
      Phrase("руководитель отделения"),
      Phrase("директор управления"),
      Phrase("директор дирекции"),
      Phrase("head of directorate"),
      Phrase("head of division"),
      Phrase("director of directorate"),
      Phrase("director of division"),
    ],
    none_of: &[],
  },
  RankRule {
    rank:    6,
    any_of:  &[
      Phrase("руководитель отдела"),
      Phrase("начальник отдела"),
      Phrase("руководитель службы"),
      Phrase("директор отдела"),
      Phrase("директор службы"),
      Phrase("head of department"),
      Phrase("head of unit"),
      Phrase("head of service"),
      Phrase("director of unit"),
      Phrase("director of service"),
    ],
    none_of: &[],
  },
  RankRule {
    rank:    7,
    any_of:  &[
      Phrase("специалист"),
      Phrase("эксперт"),
      Phrase("аналитик"),
      Phrase("specialist"),
      Phrase("expert"),
      Phrase("analyst"),
    ],
    none_of: &[],
  },
];

/// Infer a standard-scale rank from a job title using [`RANK_RULES`].
pub fn infer_rank_from_position(title: &str) -> u8 {
  infer_with(RANK_RULES, title)
}

/// Evaluate an arbitrary rule table; first match wins.
pub fn infer_with(rules: &[RankRule], title: &str) -> u8 {
  let lowered = title.to_lowercase();
  let tokens: Vec<&str> = lowered
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .collect();

  rules
    .iter()
    .find(|rule| rule.matches(&lowered, &tokens))
    .map_or(FALLBACK_RANK, |rule| rule.rank)
}
