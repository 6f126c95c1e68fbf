//! Shared tokenisation for the word index and the TF-IDF statistics engine
//! (spec §4.D, §4.E): lowercase alphanumeric runs, with a small stop-word
//! list filtered out.

use rustc_hash::FxHashSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
    "it", "its", "of", "on", "that", "the", "to", "was", "were", "will", "with",
];

/// Splits `text` into lowercased alphanumeric tokens, dropping stop words
/// and empty runs. Used for both the observation word index and the
/// TF-IDF bag-of-words model, so the two stay in lockstep.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            push_token(&mut tokens, std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        push_token(&mut tokens, current);
    }
    tokens
}

fn push_token(tokens: &mut Vec<String>, token: String) {
    if !STOP_WORDS.contains(&token.as_str()) {
        tokens.push(token);
    }
}

/// Tokenises an entity's searchable text: name, entity type, and every
/// observation, deduplicated per field but not across fields.
pub fn tokenize_entity_text(name: &str, entity_type: &str, observations: &[String]) -> Vec<String> {
    let mut out = tokenize(name);
    out.extend(tokenize(entity_type));
    for obs in observations {
        out.extend(tokenize(obs));
    }
    out
}

pub fn unique(tokens: &[String]) -> FxHashSet<String> {
    tokens.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("Hello, World-42!"), vec!["hello", "world", "42"]);
    }

    #[test]
    fn tokenize_drops_stop_words() {
        assert_eq!(tokenize("the cat and the hat"), vec!["cat", "hat"]);
    }

    #[test]
    fn tokenize_empty_string_is_empty() {
        assert!(tokenize("").is_empty());
    }
}
