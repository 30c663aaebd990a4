//! Text normalisation and display formatting shared by the diff and the
//! merge.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Biographies longer than this (in characters) are truncated for display.
pub const BIOGRAPHY_PREVIEW_CHARS: usize = 100;

/// Comparison key for names: canonical decomposition, combining marks
/// removed, lower-cased. `"Juan Pérez"` and `"juan perez"` share a key.
pub fn comparison_key(s: &str) -> String {
  s.nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
    .collect()
}

/// Whether two names are equal ignoring case and diacritics.
pub fn same_name(a: &str, b: &str) -> bool {
  comparison_key(a) == comparison_key(b)
}

/// URL slug for a person name: diacritics stripped, lower case, anything
/// other than word characters, whitespace, and `-` removed, runs of
/// whitespace or dashes collapsed to one `-`.
pub fn slugify(name: &str) -> String {
  let key = comparison_key(name);
  let kept: String = key
    .chars()
    .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
    .collect();

  kept
    .split(|c: char| c.is_whitespace() || c == '-')
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}

/// Render an ancestry path (the location itself first, then each parent up
/// to the root) as `"Rosario, Santa Fe, Argentina"`.
pub fn location_display(path: &[String]) -> String { path.join(", ") }

/// Cut `text` to [`BIOGRAPHY_PREVIEW_CHARS`] characters, marking the cut
/// with `...`.
pub fn truncate_for_display(text: &str) -> String {
  if text.chars().count() <= BIOGRAPHY_PREVIEW_CHARS {
    return text.to_owned();
  }
  let mut out: String = text.chars().take(BIOGRAPHY_PREVIEW_CHARS).collect();
  out.push_str("...");
  out
}
