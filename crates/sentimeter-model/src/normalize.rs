//! Text preprocessing shared by training and inference.

/// Lower-case `text`. Idempotent: `normalize(normalize(t)) == normalize(t)`.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Apply [`normalize`] to every element, preserving order.
pub fn normalize_all<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts.into_iter().map(|t| normalize(t.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_ascii() {
        assert_eq!(normalize("I LOVE This!"), "i love this!");
    }

    #[test]
    fn is_idempotent() {
        for text in [
            "",
            "Already lower",
            "MiXeD CaSe 123 !!",
            "ÀÉÎÕÜ straße",
            "ΣΊΣΥΦΟΣ",
            "İstanbul",
            "emoji 😀 STAYS",
        ] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn normalize_all_preserves_order_and_length() {
        let out = normalize_all(["B", "a", "C"]);
        assert_eq!(out, vec!["b", "a", "c"]);
    }
}
