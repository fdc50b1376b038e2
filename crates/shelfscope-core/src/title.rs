//! Free-text title → (series, volume) extraction.
//!
//! Rules are tried in order and the first full match wins. This is a
//! heuristic: a series whose name itself ends in digits will misparse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub series: String,
    pub volume: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRuleKind {
    /// `<series> [-:] [第]N巻`
    VolumeMarker,
    /// `<series> (N)` with half- or full-width parentheses.
    Parenthesized,
    /// `<series> N`
    TrailingNumber,
}

struct TitleRule {
    kind: TitleRuleKind,
    pattern: Regex,
}

// Digits are ASCII-only: full-width numerals never count as a volume.
static RULES: Lazy<Vec<TitleRule>> = Lazy::new(|| {
    vec![
        TitleRule {
            kind: TitleRuleKind::VolumeMarker,
            pattern: Regex::new(r"^(.*?)(?:\s*[-－:：]?\s*)?(?:第?\s*([0-9]+)\s*巻)\s*$")
                .expect("volume marker pattern"),
        },
        TitleRule {
            kind: TitleRuleKind::Parenthesized,
            pattern: Regex::new(r"^(.*?)[\s　]*[（(]\s*([0-9]+)\s*[）)]\s*$")
                .expect("parenthesized pattern"),
        },
        TitleRule {
            kind: TitleRuleKind::TrailingNumber,
            pattern: Regex::new(r"^(.*?)[\s　]+([0-9]+)\s*$").expect("trailing number pattern"),
        },
    ]
});

/// Extract series and volume from `raw`.
///
/// A rule whose number is zero or overflows `u32` is treated as not
/// matching, so the next rule gets a chance.
pub fn parse_title(raw: &str) -> ParsedTitle {
    parse_title_with_rule(raw).0
}

/// Like [`parse_title`], also reporting which rule matched.
pub fn parse_title_with_rule(raw: &str) -> (ParsedTitle, Option<TitleRuleKind>) {
    let text = raw.trim();

    for rule in RULES.iter() {
        let Some(caps) = rule.pattern.captures(text) else {
            continue;
        };
        let volume = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|v| *v > 0);
        if let (Some(volume), Some(series)) = (volume, caps.get(1)) {
            return (
                ParsedTitle {
                    series: series.as_str().trim().to_string(),
                    volume: Some(volume),
                },
                Some(rule.kind),
            );
        }
    }

    (
        ParsedTitle {
            series: text.to_string(),
            volume: None,
        },
        None,
    )
}

/// Display label for a (series, volume) pair: `"<series> N巻"` or the series alone.
pub fn volume_label(series: &str, volume: Option<u32>) -> String {
    match volume {
        Some(v) => format!("{series} {v}巻"),
        None => series.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(series: &str, volume: Option<u32>) -> ParsedTitle {
        ParsedTitle {
            series: series.to_string(),
            volume,
        }
    }

    #[test]
    fn volume_marker_with_space() {
        assert_eq!(parse_title("One Piece 5巻"), parsed("One Piece", Some(5)));
        assert_eq!(parse_title("  進撃の巨人   12巻  "), parsed("進撃の巨人", Some(12)));
    }

    #[test]
    fn volume_marker_with_dai_prefix_and_separator() {
        assert_eq!(parse_title("ハイキュー!! 第10巻"), parsed("ハイキュー!!", Some(10)));
        assert_eq!(parse_title("呪術廻戦：第3巻"), parsed("呪術廻戦", Some(3)));
        assert_eq!(parse_title("Foo - 7巻"), parsed("Foo", Some(7)));
    }

    #[test]
    fn volume_marker_wins_over_parentheses() {
        let (p, rule) = parse_title_with_rule("Foo (2) 3巻");
        assert_eq!(p, parsed("Foo (2)", Some(3)));
        assert_eq!(rule, Some(TitleRuleKind::VolumeMarker));
    }

    #[test]
    fn parenthesized_number() {
        assert_eq!(parse_title("NARUTO (2)"), parsed("NARUTO", Some(2)));
        assert_eq!(parse_title("鬼滅の刃（23）"), parsed("鬼滅の刃", Some(23)));
    }

    #[test]
    fn trailing_number() {
        let (p, rule) = parse_title_with_rule("Bleach 74");
        assert_eq!(p, parsed("Bleach", Some(74)));
        assert_eq!(rule, Some(TitleRuleKind::TrailingNumber));
        assert_eq!(parse_title("スパイファミリー　4"), parsed("スパイファミリー", Some(4)));
    }

    #[test]
    fn no_rule_matches() {
        let (p, rule) = parse_title_with_rule("Foo");
        assert_eq!(p, parsed("Foo", None));
        assert_eq!(rule, None);
        // digits glued to the name are not a volume
        assert_eq!(parse_title("Area51"), parsed("Area51", None));
    }

    #[test]
    fn series_ending_in_digits_misparses() {
        assert_eq!(parse_title("Mobile Suit 0083"), parsed("Mobile Suit", Some(83)));
    }

    #[test]
    fn zero_and_fullwidth_digits_are_not_volumes() {
        assert_eq!(parse_title("Foo 0"), parsed("Foo 0", None));
        assert_eq!(parse_title("Foo ５巻"), parsed("Foo ５巻", None));
    }

    #[test]
    fn labels() {
        assert_eq!(volume_label("Foo", Some(3)), "Foo 3巻");
        assert_eq!(volume_label("Foo", None), "Foo");
    }
}
