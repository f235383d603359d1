/// Whitespace delimited words of a line.
pub fn words(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Yields every token of `tokens` as a focus word together with the (at most
/// `size`) tokens immediately to its left, in their original order.
pub fn left_windows<'a>(tokens: &'a [&'a str], size: usize) -> impl Iterator<Item = (&'a str, &'a [&'a str])> + 'a {
    tokens.iter().enumerate().map(move |(i, focus)| {
        let start = i.saturating_sub(size);
        (*focus, &tokens[start..i])
    })
}


#[cfg(test)]
mod tests {

    use super::{left_windows, words};

    #[test]
    fn words_split_on_any_whitespace() {
        assert_eq!(words("  the\tcat  sat\n"), vec!["the", "cat", "sat"]);
        assert!(words("   ").is_empty());
        assert!(words("").is_empty());
    }

    #[test]
    fn windows_are_bounded() {

        let tokens = words("a b c d");
        let windows: Vec<(&str, Vec<&str>)> = left_windows(&tokens, 2)
            .map(|(focus, context)| (focus, context.to_vec()))
            .collect();

        assert_eq!(windows, vec![
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["a", "b"]),
            ("d", vec!["b", "c"]),
        ]);
    }

    #[test]
    fn zero_size_gives_empty_contexts() {
        let tokens = words("a b");
        assert!(left_windows(&tokens, 0).all(|(_, context)| context.is_empty()));
    }
}
