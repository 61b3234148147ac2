//! Text normalization for matching Spanish chat messages against keyword tables.
//!
//! Matching works on folded tokens: lowercase, diacritics stripped, split on
//! anything that is not alphanumeric. Multi-word terms match as consecutive token runs.

/// Lowercase and strip Spanish diacritics (á → a, ñ → n, ü → u).
pub fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Folded word tokens of `s`, in order.
pub fn tokenize(s: &str) -> Vec<String> {
    fold(s)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A keyword or phrase pre-split into folded tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    tokens: Vec<String>,
}

impl Term {
    pub fn new(phrase: &str) -> Self {
        Self {
            tokens: tokenize(phrase),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the first token run in `haystack` equal to this term, skipping runs
    /// that touch a masked position.
    pub fn find_in(&self, haystack: &[String], mask: &[bool]) -> Option<usize> {
        let n = self.tokens.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        (0..=haystack.len() - n).find(|&start| {
            haystack[start..start + n] == self.tokens[..]
                && !(start..start + n).any(|i| mask.get(i).copied().unwrap_or(false))
        })
    }
}

/// Collapse runs of whitespace to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `s`, with "..." appended when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

/// Loose phone normalization: drop WhatsApp JID suffixes, keep digits and one leading '+'.
pub fn normalize_phone(raw: &str) -> String {
    let raw = raw.trim();
    let number = raw.split('@').next().unwrap_or(raw);
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if number.trim_start().starts_with('+') && !digits.is_empty() {
        format!("+{}", digits)
    } else {
        digits
    }
}
