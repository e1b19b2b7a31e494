use lazy_static::lazy_static;
use regex::Regex;

/// Average adult reading speed, words per minute.
const WPM: f64 = 200.0;

/// Counts the words a reader actually reads: fenced and inline code are
/// skipped entirely, links count their display text but not the URL, and
/// markdown markers act as word separators.
pub fn word_count(text: &str) -> usize {
    lazy_static! {
        static ref FENCED_CODE: Regex = Regex::new(r"(?s)```.*?```").unwrap();
        static ref INLINE_CODE: Regex = Regex::new(r"`[^`]*`").unwrap();
        static ref LINK: Regex = Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap();
        static ref MARKERS: Regex = Regex::new(r"[#*_~]").unwrap();
    }

    let stripped = FENCED_CODE.replace_all(text, " ");
    let stripped = INLINE_CODE.replace_all(&stripped, " ");
    let stripped = LINK.replace_all(&stripped, "$1");
    let stripped = MARKERS.replace_all(&stripped, " ");

    stripped.split_whitespace().count()
}

/// Estimated read time in minutes. No minimum, so short posts can be < 1.
pub fn read_time_minutes(content: &str) -> f64 {
    word_count(content) as f64 / WPM
}

/// Human-readable read time, in the chronicle's tone.
pub fn format_read_time(minutes: f64) -> String {
    if minutes < 1.0 {
        return "A moment's read".to_string();
    }
    let n = minutes.ceil() as u64;
    if n == 1 {
        "A minute on the path".to_string()
    } else {
        format!("{} min on the path", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_word_count() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\n  "), 0);
    }

    #[test]
    fn test_code_is_not_read() {
        let text = "before ```rust\nlet x = 1;\nlet y = 2;\n``` after";
        assert_eq!(word_count(text), 2);

        let text = "call `do_the_thing(a, b)` now";
        assert_eq!(word_count(text), 2);
    }

    #[test]
    fn test_links_count_display_text_only() {
        let text = "see [the full story](https://example.com/a-very-long-url) here";
        assert_eq!(word_count(text), 5);

        // Empty link text contributes nothing
        let text = "see [](https://example.com) here";
        assert_eq!(word_count(text), 2);
    }

    #[test]
    fn test_markers_split_words() {
        assert_eq!(word_count("# Title\n\n**bold** _em_ ~~gone~~"), 4);
    }

    #[test]
    fn test_four_hundred_words_is_two_minutes() {
        let text = vec!["word"; 400].join(" ");
        let minutes = read_time_minutes(&text);
        assert_eq!(minutes, 2.0);
    }

    #[test]
    fn test_format_read_time() {
        assert_eq!(format_read_time(0.3), "A moment's read");
        assert_eq!(format_read_time(1.0), "A minute on the path");
        assert_eq!(format_read_time(1.2), "2 min on the path");
        assert_eq!(format_read_time(7.5), "8 min on the path");
    }
}
