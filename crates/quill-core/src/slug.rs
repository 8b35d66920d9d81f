//! Slug allocation - URL-safe unique identifiers derived from titles.

use std::future::Future;

use crate::error::RepoError;

/// Used when normalization of the source text yields nothing.
const FALLBACK_SLUG: &str = "untitled";

/// Normalize free text into a URL-safe lowercase token.
///
/// Runs of non-alphanumeric characters collapse to a single `-`;
/// leading and trailing separators are trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Derive a unique slug from `source`.
///
/// The slugified base is truncated to `max_len` before uniqueness
/// resolution so the `-N` suffix never pushes past the column limit.
/// Probes `base`, `base-1`, `base-2`, ... against `exists` until a free
/// value is found; terminates after at most (colliding slugs + 1) probes.
///
/// Not atomic against a concurrent allocation of the same base - callers
/// must treat a commit-time unique violation as a retry signal.
pub async fn allocate<F, Fut>(source: &str, max_len: usize, exists: F) -> Result<String, RepoError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool, RepoError>>,
{
    let mut base = slugify(source);
    base.truncate(max_len);
    // truncation can leave a trailing separator behind
    while base.ends_with('-') {
        base.pop();
    }
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    if !exists(base.clone()).await? {
        return Ok(base);
    }

    let mut i = 1u64;
    loop {
        let candidate = format!("{base}-{i}");
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
        i += 1;
    }
}
