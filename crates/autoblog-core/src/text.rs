//! Handle and slug helpers.

/// URL-safe slug: lowercase ASCII words joined by `-`.
pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// Display title for a handle: first character upper-cased (`pages` -> `Pages`).
pub fn title_from_handle(handle: &str) -> String {
    let mut chars = handle.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
