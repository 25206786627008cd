//! Output naming for archive entries

use sanitize_filename::sanitize;
use std::collections::HashSet;

const FALLBACK_STEM: &str = "image";

/// Reduce an uploaded filename to a stem safe to reuse in entry names.
///
/// Drops any directory part and the last extension, then strips characters
/// that are not allowed in filenames.
pub fn source_stem(original_name: &str) -> String {
    let file_name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let cleaned = sanitize(stem);
    let cleaned = cleaned.trim().trim_matches('.');

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Hands out unique stems within one request.
///
/// The first upload with a stem keeps it; later ones get `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, stem: &str) -> String {
        if self.taken.insert(stem.to_string()) {
            return stem.to_string();
        }

        let mut index = 2;
        loop {
            let candidate = format!("{}-{}", stem, index);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            index += 1;
        }
    }
}
