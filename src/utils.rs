use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest title kept after sanitizing, in characters
pub const MAX_TITLE_CHARS: usize = 100;

static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("Invalid regex"));
static ZERO_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200B}-\u{200D}\u{FEFF}]").expect("Invalid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex"));
static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("Invalid regex"));

/// Convert a title to a string usable as a file and folder name.
///
/// Filesystem-illegal and control characters become `_`, zero-width characters
/// are dropped, whitespace runs become `_`, and the result is capped at
/// [`MAX_TITLE_CHARS`]. May return an empty string.
pub fn sanitize_filename(title: &str) -> String {
    let name = ILLEGAL_CHARS.replace_all(title, "_");
    let name = ZERO_WIDTH.replace_all(&name, "");
    let name = WHITESPACE_RUN.replace_all(&name, "_");
    let name = UNDERSCORE_RUN.replace_all(&name, "_");

    let name = name.strip_prefix('_').unwrap_or(&name);
    let name = name.strip_suffix('_').unwrap_or(name);

    name.chars().take(MAX_TITLE_CHARS).collect()
}

/// `YYYYMMDD_HHMMSS` in the timestamp's own zone
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Relative path of the `index`-th (1-based) image inside an export folder
pub fn image_path(index: usize, extension: &str) -> String {
    format!("assets/images/image_{:03}.{}", index, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_sanitize_replaces_illegal_characters() {
        assert_eq!(sanitize_filename("a/b:c*d?"), "a_b_c_d");
        assert_eq!(sanitize_filename("Weekly  report\tQ3"), "Weekly_report_Q3");
        assert_eq!(sanitize_filename("__x__"), "x");
        assert_eq!(sanitize_filename("zero\u{200B}width"), "zerowidth");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "字".repeat(150);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_sanitize_of_only_separators_is_empty() {
        assert_eq!(sanitize_filename(" / "), "");
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "20240307_090501");
    }

    #[test]
    fn test_image_path_is_zero_padded() {
        assert_eq!(image_path(1, "png"), "assets/images/image_001.png");
        assert_eq!(image_path(42, "jpeg"), "assets/images/image_042.jpeg");
    }
}
