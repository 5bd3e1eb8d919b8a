//! Rule-based detection of obligation-bearing sentences and numbered
//! provisions. No model involved; a keyword list and one regex.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keywords that mark a sentence as obligation-bearing. Matched against the
/// lower-cased sentence by substring containment.
const OBLIGATION_KEYWORDS: [&str; 6] = [
    "shall",
    "must",
    "agree to",
    "is obligated",
    "obligated to",
    "required to",
];

/// Matches numbered provision references like "Section 3", "Clause 4.1a",
/// "Article 12".
static PROVISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Section|Clause|Article)\s+\d+[\w.]*").expect("provision regex is valid")
});

/// One detected clause. Keyword matches carry the 0-based sentence index;
/// provision references are not tied to a sentence and carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRecord {
    pub sentence: String,
    pub index: Option<usize>,
}

/// Scan normalized text for clauses.
///
/// Two independent passes, concatenated: the keyword scan over sentences
/// first, then the provision scan over the whole text. Document order is
/// preserved within each pass and there is no deduplication between them --
/// a sentence can contribute to both.
pub fn detect_clauses(text: &str) -> Vec<ClauseRecord> {
    let mut clauses = Vec::new();

    for (index, sentence) in split_sentences(text).into_iter().enumerate() {
        let lowered = sentence.to_lowercase();
        if OBLIGATION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            clauses.push(ClauseRecord {
                sentence,
                index: Some(index),
            });
        }
    }

    for found in PROVISION_RE.find_iter(text) {
        clauses.push(ClauseRecord {
            sentence: found.as_str().to_string(),
            index: None,
        });
    }

    clauses
}

/// Split text into sentences on terminal punctuation. Rule-based and naive
/// on purpose; abbreviations and decimal numbers split early, which only
/// narrows the window a keyword is searched in.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_scan_indexes_sentences() {
        let text = "This agreement shall terminate. The sky is blue. Tenant must pay rent.";
        let clauses = detect_clauses(text);
        let keyword: Vec<_> = clauses.iter().filter(|c| c.index.is_some()).collect();

        assert_eq!(keyword.len(), 2);
        assert_eq!(keyword[0].sentence, "This agreement shall terminate.");
        assert_eq!(keyword[0].index, Some(0));
        assert_eq!(keyword[1].sentence, "Tenant must pay rent.");
        assert_eq!(keyword[1].index, Some(2));
    }

    #[test]
    fn test_provision_scan_appends_after_keywords() {
        let text = "See Section 3.2 and Clause 5 for details.";
        let clauses = detect_clauses(text);
        let provisions: Vec<_> = clauses.iter().filter(|c| c.index.is_none()).collect();

        assert_eq!(provisions.len(), 2);
        assert_eq!(provisions[0].sentence, "Section 3.2");
        assert_eq!(provisions[1].sentence, "Clause 5");

        // All keyword matches come before any provision match.
        let first_provision = clauses.iter().position(|c| c.index.is_none()).unwrap();
        assert!(clauses[..first_provision].iter().all(|c| c.index.is_some()));
    }

    #[test]
    fn test_provision_scan_is_case_insensitive() {
        let clauses = detect_clauses("per ARTICLE 7 and section 2b");
        let sentences: Vec<_> = clauses.iter().map(|c| c.sentence.as_str()).collect();
        assert_eq!(sentences, vec!["ARTICLE 7", "section 2b"]);
    }

    #[test]
    fn test_no_deduplication_between_scans() {
        // The keyword sentence itself contains a provision reference; both
        // scans report it independently.
        let text = "Tenant shall comply with Section 4.";
        let clauses = detect_clauses(text);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].sentence, "Tenant shall comply with Section 4.");
        assert_eq!(clauses[0].index, Some(0));
        assert_eq!(clauses[1].sentence, "Section 4.");
        assert_eq!(clauses[1].index, None);
    }

    #[test]
    fn test_empty_input_yields_no_clauses() {
        assert!(detect_clauses("").is_empty());
    }

    #[test]
    fn test_sentence_without_keyword_is_skipped() {
        assert!(detect_clauses("The sky is blue.").is_empty());
    }

    #[test]
    fn test_keyword_matches_are_case_insensitive() {
        let clauses = detect_clauses("The buyer MUST deliver payment!");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].index, Some(0));
    }
}
