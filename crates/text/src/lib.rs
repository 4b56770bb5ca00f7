//! Chapter text normalization.
//!
//! The remote API hands back raw chapter markup as scraped. This crate turns
//! that into clean display/narration paragraphs: entity decoding, block-tag
//! to newline mapping, tag stripping, whitespace repair, paragraph splitting
//! with a recovery heuristic for flattened sources, and per-paragraph cleanup
//! for speech synthesis. Everything here is a pure function of its input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words-per-minute assumed by [`reading_time_minutes`] when callers have no
/// better figure.
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Fallback splitting only kicks in above this source length; shorter texts
/// with few paragraphs are genuinely short, not flattened.
const FALLBACK_MIN_LEN: usize = 200;

/// A non-trivial line must be longer than this after trimming.
const TRIVIAL_LINE_LEN: usize = 2;

static RE_NBSP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&nbsp;").unwrap());
static RE_AMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&amp;").unwrap());
static RE_LT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&lt;").unwrap());
static RE_GT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&gt;").unwrap());
static RE_QUOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&quot;").unwrap());
static RE_NUM_APOS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&#39;").unwrap());
static RE_APOS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&apos;").unwrap());

static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_P_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p>").unwrap());
static RE_DIV_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</div>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

// Collapses horizontal whitespace only. Newlines carry the paragraph
// structure at this stage and must survive until the split.
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_PARA_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static RE_CHAPTER_ABBR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCh\.\s*(\d+)").unwrap());
static RE_VOLUME_ABBR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bVol\.\s*(\d+)").unwrap());
static RE_ETC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\betc\.").unwrap());
static RE_IE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bi\.e\.").unwrap());
static RE_EG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\be\.g\.").unwrap());
static RE_ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}").unwrap());
static RE_REPEAT_BANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").unwrap());
static RE_REPEAT_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").unwrap());

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}-\u{200D}\u{FEFF}]").unwrap());

/// Result of normalizing one chapter's markup.
///
/// Paragraphs are non-empty and in reading order. Never persisted on its
/// own; it is recomputed on demand from the raw content it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    pub paragraphs: Vec<String>,
    pub word_count: usize,
}

impl ParsedContent {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Normalize raw chapter markup into clean paragraphs and a word count.
///
/// Empty or tag-only input yields an empty [`ParsedContent`]; malformed
/// markup degrades to fewer paragraphs, never to an error.
pub fn normalize(raw_markup: &str) -> ParsedContent {
    if raw_markup.is_empty() {
        return ParsedContent::default();
    }

    let text = strip_markup(raw_markup);
    let paragraphs: Vec<String> = split_paragraphs(&text)
        .iter()
        .map(|p| clean_for_speech(p))
        .filter(|p| !p.is_empty())
        .collect();
    let word_count = paragraphs.iter().map(|p| count_words(p)).sum();

    ParsedContent {
        paragraphs,
        word_count,
    }
}

/// Decode entities, map block separators to newlines, drop remaining tags
/// and repair whitespace. Entity passes run sequentially in a fixed order,
/// so double-encoded entities decode exactly one level per pass.
fn strip_markup(html: &str) -> String {
    let text = RE_NBSP.replace_all(html, " ");
    let text = RE_AMP.replace_all(&text, "&");
    let text = RE_LT.replace_all(&text, "<");
    let text = RE_GT.replace_all(&text, ">");
    let text = RE_QUOT.replace_all(&text, "\"");
    let text = RE_NUM_APOS.replace_all(&text, "'");
    let text = RE_APOS.replace_all(&text, "'");

    let text = RE_BR.replace_all(&text, "\n");
    let text = RE_P_CLOSE.replace_all(&text, "\n\n");
    let text = RE_DIV_CLOSE.replace_all(&text, "\n");

    let text = RE_TAG.replace_all(&text, "");

    let text = RE_HORIZONTAL_WS.replace_all(&text, " ");
    let text = RE_EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Split cleaned text into candidate paragraphs on blank lines.
///
/// Some sources flatten paragraph breaks to single newlines. When the blank
/// line split produces three or fewer candidates from a long text, the text
/// is re-split on single newlines and that split wins if it recovers at
/// least three additional non-trivial lines.
fn split_paragraphs(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<String> = RE_PARA_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if candidates.len() <= 3 && text.len() > FALLBACK_MIN_LEN {
        let lines: Vec<String> = text
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        let non_trivial = lines
            .iter()
            .filter(|l| l.len() > TRIVIAL_LINE_LEN)
            .count();
        if non_trivial >= candidates.len() + 3 {
            return lines;
        }
    }

    candidates
}

/// Per-paragraph cleanup before the paragraph reaches a speech synthesizer:
/// drop URLs and addresses a voice would spell out, expand abbreviations
/// engines mispronounce, and collapse runs of punctuation.
fn clean_for_speech(paragraph: &str) -> String {
    let text = RE_URL.replace_all(paragraph, "");
    let text = RE_EMAIL.replace_all(&text, "");
    let text = RE_CHAPTER_ABBR.replace_all(&text, "Chapter $1");
    let text = RE_VOLUME_ABBR.replace_all(&text, "Volume $1");
    let text = RE_ETC.replace_all(&text, "etcetera");
    let text = RE_IE.replace_all(&text, "that is");
    let text = RE_EG.replace_all(&text, "for example");
    let text = RE_ELLIPSIS.replace_all(&text, "...");
    let text = RE_REPEAT_BANG.replace_all(&text, "!");
    let text = RE_REPEAT_QUESTION.replace_all(&text, "?");
    text.trim().to_string()
}

/// Remove zero-width and byte-order-mark code points.
///
/// Speech backends read these out loud or choke on them, so utterance text
/// goes through here first.
pub fn strip_invisible(text: &str) -> String {
    RE_INVISIBLE.replace_all(text, "").trim().to_string()
}

/// Whitespace-delimited token count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time in whole minutes, rounded up.
pub fn reading_time_minutes(word_count: usize, words_per_minute: usize) -> usize {
    let wpm = words_per_minute.max(1);
    word_count.div_ceil(wpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_closed_paragraph_tags() {
        let parsed = normalize("<p>A</p><p>B</p>");
        assert_eq!(parsed.paragraphs, vec!["A", "B"]);
        assert_eq!(parsed.word_count, 2);
    }

    #[test]
    fn empty_input_yields_empty_content() {
        let parsed = normalize("");
        assert!(parsed.is_empty());
        assert_eq!(parsed.word_count, 0);
    }

    #[test]
    fn tag_only_input_yields_empty_content() {
        let parsed = normalize("<div><img src=\"x.png\"/></div>");
        assert!(parsed.paragraphs.is_empty());
    }

    #[test]
    fn decodes_entities_case_insensitively() {
        let parsed = normalize("<p>Fish &AMP; chips, &quot;now&quot;, it&#39;s &apos;fine&apos;</p>");
        assert_eq!(parsed.paragraphs, vec!["Fish & chips, \"now\", it's 'fine'"]);
    }

    #[test]
    fn decoded_angle_brackets_are_stripped_as_tags() {
        // Entity decoding runs before tag stripping, so escaped markup that
        // decodes to angle brackets is consumed by the tag pass.
        let parsed = normalize("<p>&lt;i&gt;emphasis&lt;/i&gt; survives as text only</p>");
        assert_eq!(parsed.paragraphs, vec!["emphasis survives as text only"]);
    }

    #[test]
    fn double_encoded_entities_decode_one_level() {
        // &amp;nbsp; decodes to the literal text "&nbsp;" because the nbsp
        // pass has already run by the time the amp pass produces it.
        let parsed = normalize("<p>a &amp;nbsp; b</p>");
        assert_eq!(parsed.paragraphs, vec!["a &nbsp; b"]);
    }

    #[test]
    fn br_joins_lines_within_a_paragraph() {
        let parsed = normalize("<p>first line<br/>second line</p>");
        assert_eq!(parsed.paragraphs.len(), 1);
        assert_eq!(parsed.paragraphs[0], "first line\nsecond line");
    }

    #[test]
    fn collapses_horizontal_whitespace_only() {
        let parsed = normalize("<p>spaced \t  out</p><p>next</p>");
        assert_eq!(parsed.paragraphs, vec!["spaced out", "next"]);
    }

    #[test]
    fn collapses_excess_blank_lines() {
        let parsed = normalize("A</p>\n\n\n\n\nB</p>");
        assert_eq!(parsed.paragraphs, vec!["A", "B"]);
    }

    #[test]
    fn recovers_single_newline_paragraphs_from_long_flat_text() {
        let lines: Vec<String> = (0..5)
            .map(|i| format!("This is sentence number {i} of a flattened chapter body."))
            .collect();
        let text = lines.join("\n");
        assert!(text.len() > 200);

        let parsed = normalize(&text);
        assert_eq!(parsed.paragraphs.len(), 5);
        assert_eq!(parsed.paragraphs[0], lines[0]);
    }

    #[test]
    fn short_flat_text_stays_one_paragraph() {
        let parsed = normalize("line one\nline two");
        assert_eq!(parsed.paragraphs.len(), 1);
    }

    #[test]
    fn fallback_rejected_without_enough_real_lines() {
        // Long text, but only three single-newline lines: not enough new
        // structure to justify the finer split.
        let text = format!("{}\n{}\n{}", "a".repeat(100), "b".repeat(100), "c".repeat(100));
        let parsed = normalize(&text);
        assert_eq!(parsed.paragraphs.len(), 1);
    }

    #[test]
    fn strips_urls_and_emails_for_speech() {
        let parsed = normalize("<p>Read more at https://example.com/ch1 or mail admin@example.com today</p>");
        assert_eq!(parsed.paragraphs, vec!["Read more at  or mail  today"]);
    }

    #[test]
    fn url_only_paragraph_is_dropped() {
        let parsed = normalize("<p>https://example.com/spam</p><p>Real text here</p>");
        assert_eq!(parsed.paragraphs, vec!["Real text here"]);
    }

    #[test]
    fn expands_abbreviations_for_speech() {
        let parsed = normalize("<p>See Ch. 12 and Vol. 3, etc. i.e. everything, e.g. this</p>");
        assert_eq!(
            parsed.paragraphs,
            vec!["See Chapter 12 and Volume 3, etcetera that is everything, for example this"]
        );
    }

    #[test]
    fn collapses_repeated_punctuation() {
        let parsed = normalize("<p>What....... no?!!! Really???</p>");
        assert_eq!(parsed.paragraphs, vec!["What... no?! Really?"]);
    }

    #[test]
    fn word_count_sums_final_paragraphs() {
        let parsed = normalize("<p>One two three</p><p>four five</p>");
        assert_eq!(parsed.word_count, 5);
    }

    #[test]
    fn strip_invisible_removes_zero_width_chars() {
        assert_eq!(strip_invisible("a\u{200B}b\u{FEFF}c"), "abc");
        assert_eq!(strip_invisible("  plain  "), "plain");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(400, DEFAULT_WORDS_PER_MINUTE), 2);
        assert_eq!(reading_time_minutes(401, DEFAULT_WORDS_PER_MINUTE), 3);
        assert_eq!(reading_time_minutes(0, DEFAULT_WORDS_PER_MINUTE), 0);
    }
}
