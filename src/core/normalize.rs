use std::sync::LazyLock;

use regex::Regex;

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern is valid"));

/// Turn a track descriptor into a catalog search query.
///
/// Steps, in order:
/// - remove every `(...)` group ("(Live)", "(Official Video)", ...)
/// - "Title - Artist" becomes "Artist Title" (split at the first " - ")
/// - collapse runs of whitespace and trim
///
/// Text without parentheses or " - " comes back unchanged apart from whitespace.
pub fn normalize(descriptor: &str) -> String {
    let stripped = PARENTHETICAL.replace_all(descriptor, "");

    // split before collapsing: "Song - (Audio)" still has a separator here
    match stripped.split_once(" - ") {
        Some((title, artist)) => collapse_whitespace(&format!("{artist} {title}")),
        None => collapse_whitespace(&stripped),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_artist_is_reordered() {
        assert_eq!(normalize("Bohemian Rhapsody - Queen"), "Queen Bohemian Rhapsody");
    }

    #[test]
    fn test_parenthetical_is_stripped() {
        assert_eq!(normalize("Imagine (Remastered 2010)"), "Imagine");
    }

    #[test]
    fn test_strip_then_reorder() {
        assert_eq!(
            normalize("Blueming (Official Video) - IU"),
            "IU Blueming"
        );
        assert_eq!(
            normalize("Take On Me - a-ha (Official Video) (4K)"),
            "a-ha Take On Me"
        );
    }

    #[test]
    fn test_parenthetical_can_hide_separator() {
        // " - " inside parentheses goes away with them
        assert_eq!(normalize("Yesterday (Live - 1965)"), "Yesterday");
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        for text in ["Queen Bohemian Rhapsody", "Imagine", "a-ha Take On Me", ""] {
            assert_eq!(normalize(text), text);
            assert_eq!(normalize(&normalize(text)), normalize(text));
        }
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(normalize("  Song   (Live)   Name  "), "Song Name");
    }

    #[test]
    fn test_only_first_separator_splits() {
        assert_eq!(normalize("Intro - Part 1 - Band"), "Part 1 - Band Intro");
    }

    #[test]
    fn test_dangling_separator() {
        assert_eq!(normalize("Song - (Audio)"), "Song");
        assert_eq!(normalize("(Intro) - Artist"), "Artist");
    }

    #[test]
    fn test_removed_parenthetical_leaves_no_gap() {
        assert_eq!(normalize("Hello(Live)- Adele"), "Hello- Adele");
        assert_eq!(normalize("Song -(Live)Artist"), "Song -Artist");
    }

    #[test]
    fn test_only_parenthetical_is_empty() {
        assert_eq!(normalize("(Official Audio)"), "");
    }
}
