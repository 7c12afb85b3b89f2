//! Slug and sort-key helpers.

use deunicode::deunicode;

/// Slug component used when a title has nothing slug-worthy in it
const EMPTY_SLUG: &str = "none";

/// Convert a title to a URL-safe slug component
///
/// Transliterates to ASCII, lowercases, and collapses every run of
/// non-alphanumeric characters into a single `-`.
pub fn slugify(text: &str) -> String {
    let slug = ::slug::slugify(text);
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Sort key for a title: ASCII, lowercase, punctuation folded to spaces
pub fn sortify(title: &str) -> String {
    deunicode(title)
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join a parent slug or path with a child component without doubling `/`
pub fn join_path(parent: &str, component: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, component)
    } else {
        format!("{}/{}", parent, component)
    }
}

/// CSS-friendly form of a type name: `blogPost` becomes `blog-post`
pub fn css_name(name: &str) -> String {
    let mut css = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                css.push('-');
            }
            css.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() {
            css.push(c);
            prev_lower = true;
        } else {
            if !css.is_empty() && !css.ends_with('-') {
                css.push('-');
            }
            prev_lower = false;
        }
    }
    css.trim_end_matches('-').to_string()
}
