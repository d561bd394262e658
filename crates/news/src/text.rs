//! Text normalization shared by matching and scoring.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Remove diacritics by decomposing and dropping combining marks.
#[must_use]
pub fn strip_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Lower-case and accent-strip `value` for keyword matching.
#[must_use]
pub fn normalize(value: &str) -> String {
    strip_accents(&value.to_lowercase())
}

fn is_printable(c: char) -> bool {
    if matches!(c, '\n' | '\r' | '\t' | ' ') {
        return true;
    }
    !(c.is_control()
        || c.is_whitespace()
        || matches!(c, '\u{00ad}' | '\u{200b}'..='\u{200f}' | '\u{2060}' | '\u{feff}'))
}

/// Strip non-printable characters and tidy whitespace.
///
/// Runs of spaces and tabs become one space, a newline swallows the
/// whitespace that follows it, and the result is trimmed.
#[must_use]
pub fn clean_text(value: &str) -> String {
    let mut spaced = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.chars().filter(|c| is_printable(*c)) {
        if c == ' ' || c == '\t' {
            if !in_run {
                spaced.push(' ');
            }
            in_run = true;
        } else {
            spaced.push(c);
            in_run = false;
        }
    }

    let mut out = String::with_capacity(spaced.len());
    let mut chars = spaced.chars().peekable();
    while let Some(c) = chars.next() {
        let newline = c == '\n' || (c == '\r' && chars.peek() == Some(&'\n'));
        if !newline {
            out.push(c);
            continue;
        }
        if c == '\r' {
            chars.next();
        }
        out.push('\n');
        while chars.peek().is_some_and(|n| n.is_whitespace()) {
            chars.next();
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Dólar", "dolar")]
    #[case("BANCO DE LA REPÚBLICA", "banco de la republica")]
    #[case("devaluación", "devaluacion")]
    #[case("Año", "ano")]
    fn normalizes_spanish(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("  hola \t\t mundo  ", "hola mundo")]
    #[case("uno\n   \n  dos", "uno\ndos")]
    #[case("uno\r\n\tdos", "uno\ndos")]
    #[case("a\u{0007}b\u{200b}c", "abc")]
    #[case("precio\u{00a0}del dólar", "preciodel dólar")]
    #[case("fin \nlinea", "fin \nlinea")]
    #[case("", "")]
    fn cleans_text(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_text(input), expected);
    }
}
