fn is_query_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, ' ' | '-' | ':' | '\'' | '"')
}

/// Keep letters, digits, spaces, hyphens (author names), colons, apostrophes
/// and double quotes. Everything else is dropped.
pub fn sanitize_query(query: &str) -> String {
    query.chars().filter(|ch| is_query_char(*ch)).collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize_query;

    #[test]
    fn drops_punctuation_and_markup() {
        assert_eq!(sanitize_query("<b>deep</b> learning!"), "bdeepb learning");
        assert_eq!(sanitize_query("a(b)c;d"), "abcd");
    }

    #[test]
    fn keeps_allowed_symbols() {
        assert_eq!(
            sanitize_query("O'Neil \"graph theory\" re-ranking: 2024"),
            "O'Neil \"graph theory\" re-ranking: 2024"
        );
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(sanitize_query("Åström, Gödel"), "Åström Gödel");
    }

    #[test]
    fn tabs_and_newlines_are_not_spaces() {
        assert_eq!(sanitize_query("a\tb\nc"), "abc");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(sanitize_query(""), "");
    }
}
