//! Display formatting for assistant text — pure, no I/O.
//!
//! Segments raw message text into alternating prose and fenced-code spans.
//! A fence is a triple backtick, an optional alphabetic language tag,
//! whitespace ending in a newline, the body, and a closing `\n```` ``` ````.
//! Unterminated or malformed fences degrade to prose; this never fails.
//!
//! Implemented as an explicit two-state scanner (prose / inside-fence)
//! rather than a regex, so there is no backtracking to go catastrophic.

const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text { content: String },
    Code { language: String, content: String },
}

/// Split message text into prose and code segments.
///
/// Same input always yields the same segment sequence. Input with no fence
/// (including the empty string) yields exactly one text segment equal to
/// the input.
pub fn segment_message(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(fence_start) = rest.find(FENCE) {
        let Some((language, body, after)) = parse_fence(&rest[fence_start..]) else {
            // Malformed or unterminated fence: the remainder is prose.
            break;
        };

        if fence_start > 0 {
            segments.push(Segment::Text {
                content: rest[..fence_start].to_string(),
            });
        }
        segments.push(Segment::Code {
            language: if language.is_empty() {
                "text".to_string()
            } else {
                language.to_string()
            },
            content: body.to_string(),
        });
        rest = after;
    }

    if !rest.is_empty() || segments.is_empty() {
        segments.push(Segment::Text {
            content: rest.to_string(),
        });
    }

    segments
}

/// Try to parse a complete fenced block at the start of `input` (which must
/// begin with ```` ``` ````). Returns `(language, body, rest_after_fence)`,
/// or `None` when the opener is malformed or the fence never closes.
fn parse_fence(input: &str) -> Option<(&str, &str, &str)> {
    let after_ticks = &input[FENCE.len()..];

    let lang_len = after_ticks
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    let language = &after_ticks[..lang_len];

    // Horizontal whitespace may follow the tag; the opener ends at the
    // first newline. Anything else makes the fence malformed.
    let after_lang = &after_ticks[lang_len..];
    let ws_len = after_lang
        .bytes()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r'))
        .count();
    let after_ws = &after_lang[ws_len..];
    let body_start = ws_len + after_ws.strip_prefix('\n').map(|_| 1)?;

    let body_and_rest = &after_lang[body_start..];
    let close = body_and_rest.find("\n```")?;
    let body = &body_and_rest[..close];
    let rest = &body_and_rest[close + 1 + FENCE.len()..];

    Some((language, body, rest))
}

/// Split a prose segment into display lines (paragraph-style rendering).
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text {
            content: s.to_string(),
        }
    }

    fn code(lang: &str, s: &str) -> Segment {
        Segment::Code {
            language: lang.to_string(),
            content: s.to_string(),
        }
    }

    #[test]
    fn plain_text_is_one_segment() {
        let input = "just some prose with no fences";
        assert_eq!(segment_message(input), vec![text(input)]);
    }

    #[test]
    fn empty_input_is_one_empty_text_segment() {
        assert_eq!(segment_message(""), vec![text("")]);
    }

    #[test]
    fn fence_with_language_and_surrounding_prose() {
        let input = "intro ```js\ncode()\n``` outro";
        assert_eq!(
            segment_message(input),
            vec![text("intro "), code("js", "code()"), text(" outro")]
        );
    }

    #[test]
    fn fence_without_language_defaults_to_text() {
        let input = "```\nlet x = 1;\n```";
        assert_eq!(segment_message(input), vec![code("text", "let x = 1;")]);
    }

    #[test]
    fn unterminated_fence_degrades_to_prose() {
        let input = "look: ```rust\nfn main() {}";
        assert_eq!(segment_message(input), vec![text(input)]);
    }

    #[test]
    fn opener_without_newline_degrades_to_prose() {
        let input = "inline ``` ticks ``` only";
        assert_eq!(segment_message(input), vec![text(input)]);
    }

    #[test]
    fn multiple_fences_alternate() {
        let input = "a\n```py\nx\n```\nb\n```sh\nls\n```";
        assert_eq!(
            segment_message(input),
            vec![
                text("a\n"),
                code("py", "x"),
                text("\nb\n"),
                code("sh", "ls"),
            ]
        );
    }

    #[test]
    fn multiline_code_body_is_preserved() {
        let input = "```rust\nfn f() {\n    1\n}\n```";
        assert_eq!(
            segment_message(input),
            vec![code("rust", "fn f() {\n    1\n}")]
        );
    }

    #[test]
    fn blank_line_after_opener_belongs_to_the_body() {
        let input = "```\n\nx\n```";
        assert_eq!(segment_message(input), vec![code("text", "\nx")]);
    }

    #[test]
    fn trailing_spaces_on_the_opener_line_are_tolerated() {
        let input = "```js  \ncode()\n```";
        assert_eq!(segment_message(input), vec![code("js", "code()")]);
    }

    #[test]
    fn segmentation_is_idempotent_on_same_input() {
        let input = "intro ```js\ncode()\n``` outro";
        assert_eq!(segment_message(input), segment_message(input));
    }

    #[test]
    fn paragraphs_split_on_newlines() {
        assert_eq!(paragraphs("one\ntwo\n\nthree"), vec!["one", "two", "", "three"]);
        assert_eq!(paragraphs(""), vec![""]);
    }
}
