//! Cell normalisation shared by the import pipeline.

use crate::{department::PathSegment, rank::RankScale};

/// Tokens spreadsheet exports use for "no value", compared case-insensitively
/// after trimming.
const BLANK_TOKENS: [&str; 4] = ["", "nan", "none", "null"];

pub fn is_blank(raw: &str) -> bool {
  let trimmed = raw.trim();
  BLANK_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Trimmed text, or `""` for blank cells.
pub fn clean_value(raw: &str) -> String {
  if is_blank(raw) {
    String::new()
  } else {
    raw.trim().to_owned()
  }
}

/// Like [`clean_value`], mapping `""` to `None`.
pub fn clean_optional(raw: &str) -> Option<String> {
  Some(clean_value(raw)).filter(|v| !v.is_empty())
}

/// Parse a hierarchy cell. Blank or non-numeric cells yield the scale's
/// default; numbers are truncated toward zero and clamped into the scale.
pub fn clean_rank(raw: &str, scale: RankScale) -> u8 {
  if is_blank(raw) {
    return scale.default_rank();
  }
  match raw.trim().parse::<f64>() {
    // `as` saturates for out-of-range floats.
    Ok(v) if v.is_finite() => scale.clamp(v.trunc() as i64),
    _ => scale.default_rank(),
  }
}

/// Split `"<name> (<abbrev>)"` into its display name and abbreviation.
///
/// Every parenthesised group is removed from the name; the first one becomes
/// the abbreviation. A cell consisting only of a parenthesised group uses the
/// abbreviation for both.
pub fn split_short_name(raw: &str) -> PathSegment {
  let Some(open) = raw.find('(') else {
    return PathSegment::new(raw, "");
  };
  let Some(close) = raw[open + 1..].find(')').map(|i| open + 1 + i) else {
    return PathSegment::new(raw, "");
  };

  let short_name = raw[open + 1..close].trim().to_owned();
  let name = strip_groups(raw).trim().to_owned();

  if name.is_empty() {
    PathSegment::new(short_name.clone(), short_name)
  } else {
    PathSegment::new(name, short_name)
  }
}

/// Remove every balanced `(...)` group (non-nested, shortest match).
fn strip_groups(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut rest = raw;
  while let Some(open) = rest.find('(') {
    match rest[open + 1..].find(')') {
      Some(len) => {
        out.push_str(&rest[..open]);
        rest = &rest[open + 1 + len + 1..];
      }
      None => break,
    }
  }
  out.push_str(rest);
  out
}
