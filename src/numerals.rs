const ARABIC: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
const DEVANAGARI: [char; 10] = ['०', '१', '२', '३', '४', '५', '६', '७', '८', '९'];

/// Ordinal words as they appear in chapter headings (`प्रथमोऽध्यायः` etc.).
const ORDINALS: &[(&str, u32)] = &[
    ("प्रथमो", 1),
    ("द्वितीयो", 2),
    ("तृतीयो", 3),
    ("चतुर्थो", 4),
    ("पञ्चमो", 5),
    ("षष्ठो", 6),
    ("षष्टो", 6),
    ("सप्तमो", 7),
    ("अष्टमो", 8),
    ("नवमो", 9),
    ("दशमो", 10),
    ("एकादशो", 11),
    ("एकादशमो", 11),
    ("द्वादशो", 12),
    ("त्रयोदशो", 13),
    ("चतुर्दशो", 14),
    ("पञ्चदशो", 15),
    ("षोडशो", 16),
    ("सप्तदशो", 17),
    ("अष्टादशो", 18),
    ("एकोनविंशो", 19),
    ("विंशो", 20),
    ("एकविंशो", 21),
    ("द्वाविंशो", 22),
    ("त्रयोविंशो", 23),
    ("चतुर्विंशो", 24),
    ("पञ्चविंशो", 25),
    ("पंचविंशो", 25),
    ("षड्विंशो", 26),
    ("सप्तविंशो", 27),
    ("अष्टाविंशो", 28),
];

/// Which digit script a document cites its chapter and verse numbers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum NumeralStyle {
    Devanagari,
    Arabic,
    /// Leave every label exactly as produced by the segmenter.
    Source,
}

impl NumeralStyle {
    pub fn apply(self, label: &str) -> String {
        match self {
            NumeralStyle::Devanagari => to_devanagari(label),
            NumeralStyle::Arabic => to_arabic(label),
            NumeralStyle::Source => label.to_string(),
        }
    }
}

pub fn to_devanagari(s: &str) -> String {
    s.chars()
        .map(|c| match ARABIC.iter().position(|&d| d == c) {
            Some(i) => DEVANAGARI[i],
            None => c,
        })
        .collect()
}

pub fn to_arabic(s: &str) -> String {
    s.chars()
        .map(|c| match DEVANAGARI.iter().position(|&d| d == c) {
            Some(i) => ARABIC[i],
            None => c,
        })
        .collect()
}

/// Integer value of a digit string in either script. Surrounding whitespace
/// is ignored; anything else makes the whole string unparseable.
pub fn parse_number(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    to_arabic(trimmed).parse().ok()
}

/// Resolve an ordinal word (or a heading containing one) to its number.
/// When several table entries occur in the text the longest wins, so that
/// `एकविंशो` is not read as `विंशो`.
pub fn ordinal_value(text: &str) -> Option<u32> {
    ORDINALS
        .iter()
        .filter(|(word, _)| text.contains(word))
        .max_by_key(|(word, _)| word.chars().count())
        .map(|&(_, n)| n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_digits_round_trip() {
        for (a, d) in ARABIC.iter().zip(DEVANAGARI.iter()) {
            let a = a.to_string();
            let d = d.to_string();
            assert_eq!(to_devanagari(&to_arabic(&d)), d);
            assert_eq!(to_arabic(&to_devanagari(&a)), a);
        }
    }

    #[test]
    fn converts_digit_by_digit() {
        assert_eq!(to_devanagari("105"), "१०५");
        assert_eq!(to_arabic("०७"), "07");
        assert_eq!(to_devanagari("3.12"), "३.१२");
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(to_arabic("गोभिल->१.२"), "गोभिल->1.2");
        assert_eq!(to_devanagari("abc"), "abc");
    }

    #[test]
    fn parses_both_scripts() {
        assert_eq!(parse_number("१२"), Some(12));
        assert_eq!(parse_number(" 7 "), Some(7));
        assert_eq!(parse_number("१a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn ordinal_prefers_longest_word() {
        assert_eq!(ordinal_value("प्रथमोऽध्यायः"), Some(1));
        assert_eq!(ordinal_value("एकविंशोऽध्यायः"), Some(21));
        assert_eq!(ordinal_value("एकादशमोऽध्यायः"), Some(11));
        assert_eq!(ordinal_value("विंशोऽध्यायः"), Some(20));
        assert_eq!(ordinal_value("अज्ञातः"), None);
    }

    #[test]
    fn style_applies_to_labels() {
        assert_eq!(NumeralStyle::Devanagari.apply("12"), "१२");
        assert_eq!(NumeralStyle::Arabic.apply("१२"), "12");
        assert_eq!(NumeralStyle::Source.apply("१2"), "१2");
    }
}
