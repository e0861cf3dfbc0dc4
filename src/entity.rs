//! Company-entity detection for queries and filenames.
//!
//! Detection drives the retrieval strategy: a query mentioning two or more
//! loaded companies is treated as comparative and retrieved with balanced
//! per-company quotas. The [`EntityDetector`] trait keeps the matching
//! strategy swappable: the default [`NameMatchDetector`] is a heuristic
//! name matcher and can be replaced by a real named-entity recognizer
//! without touching the retrieval orchestrator.

/// A strategy for detecting known company mentions in free text.
pub trait EntityDetector: Send + Sync {
    /// Return the subset of `known_labels` mentioned in `query`, in the
    /// order they first appear in the query text, without duplicates.
    fn detect(&self, query: &str, known_labels: &[String]) -> Vec<String>;
}

/// Case-insensitive whole-word first-match detection.
///
/// A label matches only at word boundaries, so "Apple" does not match
/// inside "Pineapple". Multi-word labels match as a whole phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatchDetector;

/// Find the first whole-word occurrence of `needle` in `haystack`.
/// Both inputs must already be lowercased.
fn find_whole_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let pos = from + rel;
        let end = pos + needle.len();
        let bounded_before =
            haystack[..pos].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let bounded_after = haystack[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if bounded_before && bounded_after {
            return Some(pos);
        }
        let step = haystack[pos..].chars().next().map_or(1, char::len_utf8);
        from = pos + step;
    }
    None
}

impl EntityDetector for NameMatchDetector {
    fn detect(&self, query: &str, known_labels: &[String]) -> Vec<String> {
        let query_lower = query.to_lowercase();

        let mut found: Vec<(usize, &String)> = Vec::new();
        for label in known_labels {
            if found.iter().any(|(_, seen)| seen.eq_ignore_ascii_case(label)) {
                continue;
            }
            if let Some(pos) = find_whole_word(&query_lower, &label.to_lowercase()) {
                found.push((pos, label));
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, label)| label.clone()).collect()
    }
}

/// Ticker symbols and name fragments mapped to canonical company labels.
const COMPANY_KEYWORDS: &[(&str, &str)] = &[
    ("TESLA", "Tesla"),
    ("TSLA", "Tesla"),
    ("NVIDIA", "Nvidia"),
    ("NVDA", "Nvidia"),
    ("APPLE", "Apple"),
    ("AAPL", "Apple"),
    ("MICROSOFT", "Microsoft"),
    ("MSFT", "Microsoft"),
    ("GOOGLE", "Google"),
    ("GOOGL", "Google"),
    ("AMAZON", "Amazon"),
    ("AMZN", "Amazon"),
    ("META", "Meta"),
    ("FB", "Meta"),
];

/// Filename tokens that never name a company.
const SKIP_WORDS: &[&str] = &[
    "10K", "10-K", "EC", "AR", "EARNINGS", "CALL", "REPORT", "ANNUAL", "Q1", "Q2", "Q3", "Q4",
    "2023", "2024", "2025", "FY",
];

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Derive a company label from an uploaded filename.
///
/// Tries the known ticker/name table first, then splits on common
/// separators and takes the first token that is not a report-jargon word,
/// and finally falls back to the first word of the filename, title-cased.
/// `"10-K TESLA.pdf"` becomes `"Tesla"`.
pub fn company_from_filename(filename: &str) -> String {
    let name = filename
        .strip_suffix(".pdf")
        .or_else(|| filename.strip_suffix(".PDF"))
        .unwrap_or(filename);
    let name_upper = name.to_uppercase();

    for (keyword, label) in COMPANY_KEYWORDS {
        if name_upper.contains(keyword) {
            return (*label).to_string();
        }
    }

    for separator in ['_', '-', ' '] {
        if !name.contains(separator) {
            continue;
        }
        for part in name.split(separator) {
            let part = part.trim();
            let part_upper = part.to_uppercase();
            if part_upper.is_empty() || SKIP_WORDS.contains(&part_upper.as_str()) {
                continue;
            }
            for (keyword, label) in COMPANY_KEYWORDS {
                if part_upper.contains(keyword) {
                    return (*label).to_string();
                }
            }
            return title_case(part);
        }
    }

    name.split_whitespace().next().map(title_case).unwrap_or_default()
}
