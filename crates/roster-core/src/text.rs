//! Text folding shared by parsers and name matching.

/// Fold full-width Latin letters and digits (`Ａ`, `ｚ`, `７`) to ASCII.
/// Everything else, including kana and kanji, is left as is.
pub fn fold_width(raw: &str) -> String {
  raw
    .chars()
    .map(|c| match c {
      'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
        char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
      }
      other => other,
    })
    .collect()
}

/// Case-insensitive key for substring matching of names: width-folded, then
/// lowercased.
pub fn match_key(raw: &str) -> String { fold_width(raw).to_lowercase() }
