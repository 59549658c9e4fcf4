//! Mini-parser for tool-call tags embedded in model output.
//!
//! The model requests side effects with one self-closing tag per turn:
//!
//! ```text
//! <tool_call function="write_file" path="hello.txt" content="Hi"/>
//! ```
//!
//! The grammar is deliberately forgiving. Attribute values may be delimited
//! by either quote character, and the value of the trailing attribute runs
//! to the last matching quote immediately before the tag's `/>`. That rule
//! lets file content carry stray quote characters, at the cost of a known
//! ambiguity: a legitimate quote-then-`/>` sequence inside content cannot be
//! distinguished from the tag terminator. This is an accepted limitation of
//! the wire format, not something to be guessed around.

use std::sync::OnceLock;

use regex::Regex;

use crate::tools::ToolCall;

/// Function name for the file-writing tool.
pub const WRITE_FILE_FUNCTION: &str = "write_file";
/// Function name for the shell-execution tool.
pub const RUN_CODE_FUNCTION: &str = "run_code";

fn tool_tag_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?s)<tool_call\s+.*?\s*/>").expect("tool tag regex must compile")
    })
}

fn function_name_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"function=["'](write_file|run_code)["']"#)
            .expect("function name regex must compile")
    })
}

fn path_attr_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"path=["']([^"']+)["']"#).expect("path attribute regex must compile")
    })
}

// The `regex` crate has no backreferences, so the "closing delimiter is the
// same quote that opened the value" rule is spelled as one branch per quote
// kind. Lazy repetition plus the `/>` anchor keeps the original semantics:
// the value ends at the first matching quote directly before the terminator.
fn content_attr_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"(?s)content="(.*?)"\s*/>|content='(.*?)'\s*/>"#)
            .expect("content attribute regex must compile")
    })
}

fn command_attr_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"(?s)command="(.*?)"\s*/>|command='(.*?)'\s*/>"#)
            .expect("command attribute regex must compile")
    })
}

fn think_segment_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?s)<think>.*?</think>").expect("think segment regex must compile")
    })
}

/// Reverses the escaping convention the model is instructed to use.
///
/// Order matters and is fixed: HTML entities first (`&quot;`, `&amp;`), then
/// the two-character backslash sequences `\n`, `\t`, `\r`, `\\` as
/// sequential replacements. The sequential semantics mean a literal
/// backslash-n in source text unescapes to a real newline; the convention
/// cannot represent that sequence, which is part of the wire contract.
/// Applying this to text containing none of the six sequences is a no-op.
pub fn unescape(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
        .replace("\\\\", "\\")
}

/// Removes `<think>...</think>` segments from a model reply.
pub fn strip_think_segments(text: &str) -> String {
    think_segment_regex().replace_all(text, "").trim().to_string()
}

/// Lazy sequence of recognized tool invocations in text order.
///
/// Tags with an unrecognized function name are skipped silently; tags with a
/// recognized name but missing required attributes are skipped with a
/// warning pushed to `warnings`. Consumers normally take only the first
/// item; the iterator cannot be restarted.
pub struct ToolCalls<'t, 'w> {
    tags: regex::Matches<'static, 't>,
    warnings: &'w mut Vec<String>,
}

pub fn tool_calls<'t, 'w>(text: &'t str, warnings: &'w mut Vec<String>) -> ToolCalls<'t, 'w> {
    ToolCalls {
        tags: tool_tag_regex().find_iter(text),
        warnings,
    }
}

impl Iterator for ToolCalls<'_, '_> {
    type Item = ToolCall;

    fn next(&mut self) -> Option<ToolCall> {
        loop {
            let tag = self.tags.next()?.as_str();
            match recognize_tag(tag) {
                TagOutcome::Call(call) => return Some(call),
                TagOutcome::Malformed(warning) => self.warnings.push(warning),
                TagOutcome::UnknownFunction => {}
            }
        }
    }
}

enum TagOutcome {
    Call(ToolCall),
    Malformed(String),
    UnknownFunction,
}

fn recognize_tag(tag: &str) -> TagOutcome {
    let Some(function) = function_name_regex()
        .captures(tag)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str())
    else {
        return TagOutcome::UnknownFunction;
    };

    match function {
        WRITE_FILE_FUNCTION => {
            let path = path_attr_regex()
                .captures(tag)
                .and_then(|captures| captures.get(1));
            let content = trailing_attr(content_attr_regex(), tag);
            match (path, content) {
                (Some(path), Some(content)) => TagOutcome::Call(ToolCall::WriteFile {
                    path: unescape(path.as_str()),
                    content: unescape(content),
                }),
                _ => TagOutcome::Malformed(format!(
                    "Incomplete or unparseable write_file call: {tag}"
                )),
            }
        }
        RUN_CODE_FUNCTION => match trailing_attr(command_attr_regex(), tag) {
            Some(command) => TagOutcome::Call(ToolCall::RunCode {
                command: unescape(command),
            }),
            None => TagOutcome::Malformed(format!("Incomplete or unparseable run_code call: {tag}")),
        },
        _ => TagOutcome::UnknownFunction,
    }
}

/// Extracts the value of a terminator-anchored attribute; the two capture
/// groups correspond to the double- and single-quoted branches.
fn trailing_attr<'t>(regex: &Regex, tag: &'t str) -> Option<&'t str> {
    regex
        .captures(tag)
        .and_then(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|group| group.as_str())
}

#[cfg(test)]
mod tests {
    use super::{strip_think_segments, tool_calls, unescape};
    use crate::tools::ToolCall;

    fn first_call(text: &str) -> (Option<ToolCall>, Vec<String>) {
        let mut warnings = Vec::new();
        let call = tool_calls(text, &mut warnings).next();
        (call, warnings)
    }

    #[test]
    fn extracts_write_file_call_with_double_quotes() {
        let (call, warnings) =
            first_call(r#"Sure. <tool_call function="write_file" path="hello.txt" content="Hi"/>"#);

        assert_eq!(
            call,
            Some(ToolCall::WriteFile {
                path: "hello.txt".to_string(),
                content: "Hi".to_string(),
            })
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn extracts_run_code_call_with_single_quotes() {
        let (call, _) = first_call("<tool_call function='run_code' command='python main.py'/>");

        assert_eq!(
            call,
            Some(ToolCall::RunCode {
                command: "python main.py".to_string(),
            })
        );
    }

    #[test]
    fn content_may_contain_the_other_quote_character() {
        let (call, _) = first_call(
            r#"<tool_call function="write_file" path="a.py" content="print('it works')"/>"#,
        );

        assert_eq!(
            call,
            Some(ToolCall::WriteFile {
                path: "a.py".to_string(),
                content: "print('it works')".to_string(),
            })
        );
    }

    #[test]
    fn content_value_runs_to_the_quote_before_the_terminator() {
        // Internal unescaped double quotes survive because only a quote
        // directly before `/>` closes the value.
        let (call, _) = first_call(
            r#"<tool_call function="write_file" path="a.txt" content="say "hi" twice"/>"#,
        );

        assert_eq!(
            call,
            Some(ToolCall::WriteFile {
                path: "a.txt".to_string(),
                content: r#"say "hi" twice"#.to_string(),
            })
        );
    }

    #[test]
    fn only_the_first_well_formed_call_is_yielded_first() {
        let text = concat!(
            r#"<tool_call function="run_code" command="echo one"/>"#,
            " and then ",
            r#"<tool_call function="run_code" command="echo two"/>"#,
        );

        let mut warnings = Vec::new();
        let calls: Vec<ToolCall> = tool_calls(text, &mut warnings).collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            ToolCall::RunCode {
                command: "echo one".to_string(),
            }
        );
    }

    #[test]
    fn malformed_tag_is_skipped_with_warning_and_later_tag_still_parses() {
        let text = concat!(
            r#"<tool_call function="write_file" path="x.txt"/>"#,
            r#"<tool_call function="run_code" command="ls"/>"#,
        );

        let (call, warnings) = first_call(text);
        assert_eq!(
            call,
            Some(ToolCall::RunCode {
                command: "ls".to_string(),
            })
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("write_file"));
    }

    #[test]
    fn unrecognized_function_names_are_skipped_silently() {
        let (call, warnings) =
            first_call(r#"<tool_call function="browse_web" url="http://example.test"/>"#);
        assert_eq!(call, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn text_without_tags_yields_nothing() {
        let (call, warnings) = first_call("Done.");
        assert_eq!(call, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn unescape_reverses_entities_then_backslash_sequences() {
        assert_eq!(
            unescape(r"line one\nline two\twith &quot;quotes&quot; &amp; more"),
            "line one\nline two\twith \"quotes\" & more"
        );
    }

    #[test]
    fn unescape_is_identity_on_plain_text() {
        let plain = "already unescaped: \"quotes\", newline\nand & ampersand";
        assert_eq!(unescape(plain), plain);
    }

    #[test]
    fn escaped_content_round_trips_to_plain_text() {
        // The escaped form of `say "hi"` followed by a newline.
        let (call, _) = first_call(
            r#"<tool_call function="write_file" path="t.txt" content="say &quot;hi&quot;\nsecond line"/>"#,
        );

        assert_eq!(
            call,
            Some(ToolCall::WriteFile {
                path: "t.txt".to_string(),
                content: "say \"hi\"\nsecond line".to_string(),
            })
        );
    }

    #[test]
    fn strip_think_segments_removes_reasoning_blocks() {
        let reply = "<think>internal\nnotes</think>Final answer.";
        assert_eq!(strip_think_segments(reply), "Final answer.");
    }

    #[test]
    fn strip_think_segments_leaves_plain_replies_untouched() {
        assert_eq!(strip_think_segments("  Done. "), "Done.");
    }
}
