//! Release id and filename slug derivation.

/// Maximum length of a track filename slug.
const TITLE_SLUG_MAX_LEN: usize = 40;

/// Derive the release id: artist slug, release-name initials, creation
/// timestamp. The timestamp suffix makes the id globally unique; the
/// readable prefix makes storage keys self-describing.
///
/// `("DJ Test", "First EP", 1700000000)` → `dj_test_FE-1700000000`.
pub fn release_id(artist_name: &str, release_name: &str, timestamp: i64) -> String {
    format!(
        "{}_{}-{}",
        artist_slug(artist_name),
        release_initials(release_name),
        timestamp
    )
}

/// Lowercased artist name with non-alphanumeric runs collapsed to `_`.
pub fn artist_slug(name: &str) -> String {
    let slug = collapse(name, '_');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.chars().take(60).collect()
    }
}

/// Uppercase first letter of each whitespace-separated word.
pub fn release_initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .map(|c| c.to_ascii_uppercase())
        .take(6)
        .collect();

    if initials.is_empty() {
        "X".to_string()
    } else {
        initials
    }
}

/// Sanitized, length-capped track title for filenames: lowercase
/// alphanumeric runs joined by `-`.
pub fn title_slug(title: &str) -> String {
    let slug: String = collapse(title, '-').chars().take(TITLE_SLUG_MAX_LEN).collect();
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "track".to_string()
    } else {
        slug
    }
}

fn collapse(input: &str, separator: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push(separator);
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}
