// generation/sanitize.rs - Text clean-up applied before speech synthesis
use regex::Regex;

/// Upstream speech services reject longer inputs.
pub const SPEECH_TEXT_LIMIT: usize = 1000;

/// Characters that collide with the synthesis transport (query strings and
/// SSML markup) and are therefore percent-encoded.
const RESERVED: &[char] = &['%', '&', '+', '=', '#', '?', '/', '\\', '<', '>', '"'];

lazy_static::lazy_static! {
    static ref LINE_BREAKS: Regex = Regex::new(r"[\t\r\n]+").expect("static pattern");
    static ref NON_PRINTABLE: Regex = Regex::new(r"[\p{Cc}\p{Cf}\p{Co}]").expect("static pattern");
}

/// Keeps the first `SPEECH_TEXT_LIMIT` characters, then strips control and
/// non-printable characters and percent-encodes reserved ones. Runs of tabs
/// and line breaks become a single space instead of being removed, so words
/// on either side stay apart.
pub fn sanitize_for_speech(text: &str) -> String {
    let truncated: String = text.chars().take(SPEECH_TEXT_LIMIT).collect();
    let flattened = LINE_BREAKS.replace_all(&truncated, " ");
    let printable = NON_PRINTABLE.replace_all(&flattened, "");

    let mut out = String::with_capacity(printable.len());
    for c in printable.chars() {
        if RESERVED.contains(&c) {
            let mut buf = [0u8; 4];
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_input_is_cut_to_the_first_thousand_characters() {
        let input: String = "a".repeat(SPEECH_TEXT_LIMIT) + &"b".repeat(500);
        let out = sanitize_for_speech(&input);
        assert_eq!(out.chars().count(), SPEECH_TEXT_LIMIT);
        assert!(!out.contains('b'));
    }

    #[test]
    fn truncation_happens_before_stripping() {
        // 999 visible chars, a control char at position 1000, then more text;
        // the cut lands before anything after the control char is considered.
        let input = format!("{}\u{0007}{}", "x".repeat(999), "y".repeat(600));
        let out = sanitize_for_speech(&input);
        assert_eq!(out, "x".repeat(999));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let input = "é".repeat(1500);
        let out = sanitize_for_speech(&input);
        assert_eq!(out.chars().count(), SPEECH_TEXT_LIMIT);
    }

    #[test]
    fn control_and_format_characters_are_stripped() {
        let out = sanitize_for_speech("Stop!\u{0000} The cup\u{200B} is full");
        assert_eq!(out, "Stop! The cup is full");
    }

    #[test]
    fn line_breaks_become_spaces() {
        assert_eq!(sanitize_for_speech("one\r\ntwo\tthree"), "one two three");
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        assert_eq!(sanitize_for_speech("tea & zen"), "tea %26 zen");
        assert_eq!(sanitize_for_speech("100%"), "100%25");
        assert_eq!(sanitize_for_speech("<break/>"), "%3Cbreak%2F%3E");
    }

    #[test]
    fn ordinary_punctuation_survives() {
        let text = "\"Stop!\" the student exclaimed, it's full.";
        assert_eq!(
            sanitize_for_speech(text),
            "%22Stop!%22 the student exclaimed, it's full."
        );
    }
}
