//! Free-text label matching shared by the role normalizer, the taxonomy
//! normalizer and the friction-point cross-reference.

use std::collections::BTreeSet;

/// Words that carry no signal when comparing labels.
const STOPWORDS: &[&str] = &["and", "of", "the", "for", "a", "an", "to", "in", "&"];

/// Minimum length for a substring-containment match to count.
pub const MIN_CONTAINMENT_LEN: usize = 3;

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split a label into lowercase tokens on common delimiters.
pub fn tokens(label: &str) -> BTreeSet<String> {
    label
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity between the token sets of two labels.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    shared / union
}

/// Whether either normalized label contains the other.
///
/// Returns the length of the shorter side on a match so callers can prefer
/// the most specific hit.
pub fn containment(label: &str, candidate: &str) -> Option<usize> {
    let l = normalize_label(label);
    let c = normalize_label(candidate);
    if l.len() < MIN_CONTAINMENT_LEN || c.len() < MIN_CONTAINMENT_LEN {
        return None;
    }
    if contains_words(&l, &c) || contains_words(&c, &l) {
        Some(l.len().min(c.len()))
    } else {
        None
    }
}

/// `haystack` contains `needle` at word boundaries.
fn contains_words(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Outcome of matching a label against a list of named candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelMatch {
    /// Normalized label equals the candidate's primary name.
    Exact(usize),
    /// Normalized label equals one of the candidate's aliases.
    Alias(usize),
    /// Containment or token overlap above the threshold.
    Fuzzy(usize, f64),
}

impl LabelMatch {
    pub fn index(&self) -> usize {
        match *self {
            LabelMatch::Exact(i) | LabelMatch::Alias(i) | LabelMatch::Fuzzy(i, _) => i,
        }
    }
}

/// Match `label` against candidates given as `(name, aliases)` pairs.
///
/// Order: exact name, exact alias, containment (longest wins), then token
/// overlap at or above `min_overlap` (highest wins, earliest on ties).
pub fn match_label<'a, I>(label: &str, candidates: I, min_overlap: f64) -> Option<LabelMatch>
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let needle = normalize_label(label);
    if needle.is_empty() {
        return None;
    }

    let candidates: Vec<(&str, &[String])> = candidates.into_iter().collect();

    if let Some(i) = candidates
        .iter()
        .position(|(name, _)| normalize_label(name) == needle)
    {
        return Some(LabelMatch::Exact(i));
    }

    if let Some(i) = candidates.iter().position(|(_, aliases)| {
        aliases.iter().any(|a| normalize_label(a) == needle)
    }) {
        return Some(LabelMatch::Alias(i));
    }

    let mut best_contained: Option<(usize, usize)> = None;
    for (i, (name, aliases)) in candidates.iter().enumerate() {
        let hit = std::iter::once(*name)
            .chain(aliases.iter().map(String::as_str))
            .filter_map(|c| containment(&needle, c))
            .max();
        if let Some(len) = hit {
            if best_contained.map_or(true, |(_, best)| len > best) {
                best_contained = Some((i, len));
            }
        }
    }
    if let Some((i, _)) = best_contained {
        return Some(LabelMatch::Fuzzy(i, 1.0));
    }

    let mut best_overlap: Option<(usize, f64)> = None;
    for (i, (name, aliases)) in candidates.iter().enumerate() {
        let score = std::iter::once(*name)
            .chain(aliases.iter().map(String::as_str))
            .map(|c| token_overlap(&needle, c))
            .fold(0.0_f64, f64::max);
        if score >= min_overlap && best_overlap.map_or(true, |(_, best)| score > best) {
            best_overlap = Some((i, score));
        }
    }

    best_overlap.map(|(i, score)| LabelMatch::Fuzzy(i, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[(&'static str, Vec<String>)]) -> Vec<(&'static str, Vec<String>)> {
        items.to_vec()
    }

    #[test]
    fn test_tokens_split_and_drop_stopwords() {
        let t = tokens("Accounts Payable / Receivable & Billing");
        assert!(t.contains("accounts"));
        assert!(t.contains("receivable"));
        assert!(!t.contains("&"));
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_token_overlap() {
        assert_eq!(token_overlap("data analyst", "data analyst"), 1.0);
        let score = token_overlap("senior data analyst", "data analyst");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(token_overlap("", "anything"), 0.0);
    }

    #[test]
    fn test_containment_requires_word_boundary() {
        assert!(containment("Senior Accountant", "accountant").is_some());
        assert!(containment("Accountants", "accountant").is_none());
        assert!(containment("AP", "ap clerk").is_none());
    }

    #[test]
    fn test_match_label_order() {
        let table = names(&[
            ("Data Analyst", vec!["analytics specialist".to_string()]),
            ("Data Scientist", vec!["ml engineer".to_string()]),
        ]);
        let candidates = || table.iter().map(|(n, a)| (*n, a.as_slice()));

        assert_eq!(
            match_label("data analyst", candidates(), 0.4),
            Some(LabelMatch::Exact(0))
        );
        assert_eq!(
            match_label("ML Engineer", candidates(), 0.4),
            Some(LabelMatch::Alias(1))
        );
        assert!(matches!(
            match_label("Lead Data Scientist", candidates(), 0.4),
            Some(LabelMatch::Fuzzy(1, _))
        ));
        assert_eq!(match_label("Forklift Operator", candidates(), 0.4), None);
    }
}
