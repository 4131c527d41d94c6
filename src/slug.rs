//! URL-safe album identifiers.
//!
//! A slug is a lowercase run of ASCII letters and digits separated by single
//! hyphens: `summer-roadtrip-2024`. Slugs come from one of two places:
//!
//! - **Derived** from a free-text title via [`slugify`]. Letters are
//!   lowercased, digits pass through, and every run of anything else
//!   (spaces, punctuation, accented letters, stray hyphens) collapses into a
//!   single separator.
//! - **Supplied** explicitly by the caller. These are validated, not
//!   corrected: `Summer-Trip` is accepted and lowercased, `summer--trip` is
//!   rejected.
//!
//! Uniqueness is not checked here. The store owns that and reports a
//! collision as [`StorageError::Conflict`](crate::storage::StorageError::Conflict).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Normalization left nothing, e.g. a title made only of punctuation.
    #[error("'{0}' does not contain any letters or digits to build a slug from")]
    Empty(String),
    /// An explicit slug that does not match `^[a-z0-9]+(-[a-z0-9]+)*$`.
    #[error("slug '{0}' may only contain letters, numbers, and single hyphens")]
    Invalid(String),
}

/// Derive a slug from free text.
///
/// Returns an empty string when the input has no ASCII letters or digits;
/// use [`resolve_slug`] to get that surfaced as an error.
///
/// - `"Summer Roadtrip"` → `"summer-roadtrip"`
/// - `"  Hello,   World!! "` → `"hello-world"`
/// - `"--already--hyphenated--"` → `"already-hyphenated"`
/// - `"Café 2024"` → `"caf-2024"`
pub fn slugify(value: &str) -> String {
    let value = value.trim();
    let mut out = String::with_capacity(value.len());
    let mut pending_hyphen = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Whether `value` is already a well-formed, lowercase slug.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|part| {
            !part.is_empty() && part.bytes().all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9'))
        })
}

/// Validate an explicitly supplied slug. Uppercase letters are accepted and
/// lowercased; anything else outside the pattern is an error.
pub fn validate_slug(value: &str) -> Result<String, SlugError> {
    let lowered = value.trim().to_ascii_lowercase();
    if is_valid_slug(&lowered) {
        Ok(lowered)
    } else {
        Err(SlugError::Invalid(value.trim().to_string()))
    }
}

/// Pick the slug for a new album: the explicit one when given (and non-blank),
/// otherwise one derived from the title.
pub fn resolve_slug(title: &str, explicit: Option<&str>) -> Result<String, SlugError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(manual) => validate_slug(manual),
        None => {
            let derived = slugify(title);
            if derived.is_empty() {
                Err(SlugError::Empty(title.trim().to_string()))
            } else {
                Ok(derived)
            }
        }
    }
}
