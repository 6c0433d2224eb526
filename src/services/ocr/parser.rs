/// Keep only ASCII digits and decimal points from raw OCR text
pub fn clean_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parse a sensor reading from OCR text.
///
/// Every character other than `0-9` and `.` is discarded before parsing.
/// Returns `None` when nothing parseable remains (empty text, a lone `.`,
/// or several decimal points such as `12.3.4`).
pub fn parse_reading(text: &str) -> Option<f64> {
    let clean = clean_numeric(text);
    if clean.is_empty() {
        return None;
    }

    clean.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_with_unit() {
        assert_eq!(parse_reading("12.5 ppm"), Some(12.5));
    }

    #[test]
    fn test_parse_leading_zeros() {
        assert_eq!(parse_reading("007"), Some(7.0));
    }

    #[test]
    fn test_parse_dashes_is_absent() {
        assert_eq!(parse_reading("--"), None);
    }

    #[test]
    fn test_parse_empty_is_absent() {
        assert_eq!(parse_reading(""), None);
        assert_eq!(parse_reading("  \n"), None);
    }

    #[test]
    fn test_parse_multiple_dots_is_absent() {
        assert_eq!(parse_reading("1.2.3"), None);
        assert_eq!(parse_reading("12.3.4"), None);
    }

    #[test]
    fn test_parse_lone_dot_is_absent() {
        assert_eq!(parse_reading("."), None);
    }

    #[test]
    fn test_parse_zero_is_a_value() {
        assert_eq!(parse_reading("0"), Some(0.0));
        assert_eq!(parse_reading("0.0\n"), Some(0.0));
    }

    #[test]
    fn test_parse_tesseract_noise() {
        // Trailing newline and form feed are what the CLI prints
        assert_eq!(parse_reading("35.2\n\x0c"), Some(35.2));
        assert_eq!(parse_reading(" 4 1 "), Some(41.0));
    }

    #[test]
    fn test_clean_numeric() {
        assert_eq!(clean_numeric("PM2.5: 18 ug/m3"), "2.5183");
        assert_eq!(clean_numeric("abc"), "");
    }
}
