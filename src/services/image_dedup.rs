//! Image URL deduplication
//!
//! Image search APIs return the same photo many times over: at different
//! sizes, behind different query strings, or under numbered variant filenames
//! (`venue-1.jpg`, `venue_2.jpg`). Each URL is reduced to two keys and kept
//! only if neither has been seen before:
//!
//! 1. the URL with its query string and fragment stripped, lower-cased;
//! 2. the last path segment, lower-cased, with digits, hyphens and underscores
//!    removed. Keys of five characters or fewer are too ambiguous and are
//!    ignored, so such URLs only dedupe on the first key.
//!
//! Entries that cannot be parsed as a URL are never dropped for being
//! malformed; they dedupe against each other by exact text only.

use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Filename keys at or below this length are not used for variant matching
const MAX_AMBIGUOUS_KEY_LEN: usize = 5;

/// Base used to resolve bare filenames and path-only references
const PLACEHOLDER_BASE: &str = "https://placeholder.invalid/";

/// Order-preserving set of image URLs that tracks both dedup keys
#[derive(Debug, Default, Clone)]
pub struct ImageUrlSet {
    exact_keys: HashSet<String>,
    variant_keys: HashSet<String>,
    raw_entries: HashSet<String>,
    urls: Vec<String>,
}

impl ImageUrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a URL to the set; returns `true` if it was kept
    pub fn insert(&mut self, raw: &str) -> bool {
        let Some(parsed) = parse_image_url(raw) else {
            return self.insert_raw(raw.to_string());
        };

        let exact = exact_key(raw);
        let variant = variant_key(&parsed);

        if self.exact_keys.contains(&exact) {
            return false;
        }
        if let Some(key) = &variant {
            if self.variant_keys.contains(key) {
                return false;
            }
        }

        self.exact_keys.insert(exact);
        if let Some(key) = variant {
            self.variant_keys.insert(key);
        }
        self.urls.push(raw.to_string());
        true
    }

    /// Keeps `text` unless the exact same malformed entry was already kept
    fn insert_raw(&mut self, text: String) -> bool {
        if !self.raw_entries.insert(text.clone()) {
            return false;
        }
        self.urls.push(text);
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

/// Collapses exact and near-duplicate image URLs, preserving first-seen order
pub fn deduplicate_image_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut set = ImageUrlSet::new();
    for url in urls {
        set.insert(url.as_ref());
    }
    set.into_vec()
}

/// Deduplicates a raw JSON array of image candidates
///
/// String values go through the normal URL rules. Anything else (numbers,
/// nulls, objects) is passed through and only collapses with an identical
/// value.
pub fn deduplicate_image_values(values: &[Value]) -> Vec<Value> {
    let mut exact = ImageUrlSet::new();
    let mut seen_other: HashSet<String> = HashSet::new();
    let mut output = Vec::with_capacity(values.len());

    for value in values {
        let keep = match value {
            Value::String(s) => exact.insert(s),
            other => seen_other.insert(other.to_string()),
        };
        if keep {
            output.push(value.clone());
        }
    }

    output
}

fn parse_image_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PLACEHOLDER_BASE).ok()?.join(trimmed).ok()
        }
        Err(_) => None,
    }
}

fn exact_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let end = trimmed
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(trimmed.len());
    trimmed[..end].to_lowercase()
}

fn variant_key(url: &Url) -> Option<String> {
    let filename = url.path_segments()?.last()?;
    let key: String = filename
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != '-' && *c != '_')
        .collect();

    (key.chars().count() > MAX_AMBIGUOUS_KEY_LEN).then_some(key)
}
