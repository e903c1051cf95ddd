//! Near-duplicate detection between text fragments.
//!
//! Provider output is prone to repeating the same sentence across sections
//! with superficial rewording, so exact equality is not enough: token
//! overlap catches paraphrase-level duplication, containment catches
//! verbatim-substring duplication.

use std::collections::HashSet;

/// Token-overlap (Jaccard) ratio above which two fragments are duplicates.
const JACCARD_THRESHOLD: f64 = 0.6;

/// Minimum normalized length for the containment check to apply.
const CONTAINMENT_MIN_LEN: usize = 20;

/// True when two fragments are near-duplicates of each other.
pub fn similar(a: &str, b: &str) -> bool {
    let a = normalize_text(a);
    let b = normalize_text(b);

    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    if jaccard(&a, &b) >= JACCARD_THRESHOLD {
        return true;
    }

    // Containment: a long fragment repeated verbatim inside a longer one.
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    shorter.len() >= CONTAINMENT_MIN_LEN && longer.contains(shorter.as_str())
}

/// Lowercase, strip non-alphanumerics, collapse whitespace, trim.
fn normalize_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token-set Jaccard similarity over whitespace-split words.
fn jaccard(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}
