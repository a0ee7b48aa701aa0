//! Text normalization shared by every ranking stage.

/// Lowercases `text` and collapses every run of whitespace into a single space,
/// trimming both ends. `None` and blank input normalize to an empty string.
pub fn normalize_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_collapses_whitespace() {
        let input = "  Senior   RUST\tEngineer\n\n with  Kafka ";
        assert_eq!(
            normalize_text(Some(input)),
            "senior rust engineer with kafka"
        );
    }

    #[test]
    fn test_none_and_blank_yield_empty() {
        assert_eq!(normalize_text(None), "");
        assert_eq!(normalize_text(Some("")), "");
        assert_eq!(normalize_text(Some(" \t\r\n ")), "");
    }

    #[test]
    fn test_is_idempotent() {
        let samples = [
            "Python  Developer\nREACT",
            "\u{a0}non-breaking\u{2003}spaces\u{a0}",
            "ÄÖÜ   Straße",
            "",
            "already normal text",
        ];
        for sample in samples {
            let once = normalize_text(Some(sample));
            let twice = normalize_text(Some(&once));
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
