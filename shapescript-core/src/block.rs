//! Script lines, indentation, and block extraction.
//!
//! The script is split once into [`Line`]s that keep their original line
//! numbers for error reporting; control-flow headers carve out their
//! bodies with [`extract_block`]. Indentation is measured in columns
//! with tabs expanding to the next multiple of 4, so mixed tab/space
//! scripts behave predictably.

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// One physical line of the format script.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// The raw line text, indentation and comment included.
    pub text: &'a str,
    /// 1-based line number in the original script.
    pub number: usize,
}

/// Split a script into lines.
#[must_use]
pub fn split_lines(script: &str) -> Vec<Line<'_>> {
    script
        .lines()
        .enumerate()
        .map(|(i, text)| Line { text, number: i + 1 })
        .collect()
}

// ---------------------------------------------------------------------------
// Indentation and comments
// ---------------------------------------------------------------------------

/// Tab stop used for indentation arithmetic.
const TAB_STOP: usize = 4;

/// Indentation width of a line in columns, tabs expanding to the next
/// multiple of [`TAB_STOP`].
#[must_use]
pub fn indent_width(text: &str) -> usize {
    let mut width = 0;
    for c in text.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / TAB_STOP + 1) * TAB_STOP,
            _ => break,
        }
    }
    width
}

/// Strip a `//` comment, ignoring markers inside `"..."` or `'...'`.
#[must_use]
pub fn strip_comment(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == b'"' || c == b'\'' {
                    quote = Some(c);
                } else if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
                    return &text[..i];
                }
            }
        }
        i += 1;
    }
    text
}

/// Whether a line is blank once its comment is stripped.
#[must_use]
pub fn is_blank(text: &str) -> bool {
    strip_comment(text).trim().is_empty()
}

// ---------------------------------------------------------------------------
// Block extraction
// ---------------------------------------------------------------------------

/// Extract the indented block following the header at `lines[header_idx]`.
///
/// Returns the block's lines and its established indentation column. The
/// column is `None` when no line deeper than the header was found; the
/// caller reports the missing block.
///
/// The first non-blank line establishes the block column; lines stay in
/// the block while indented at least that far. Blank lines ride along
/// without affecting the bookkeeping. A line at or left of the header's
/// column ends the block (exclusive).
#[must_use]
pub fn extract_block<'a>(
    lines: &'a [Line<'a>],
    header_idx: usize,
    header_indent: usize,
) -> (&'a [Line<'a>], Option<usize>) {
    let mut block_indent = None;
    let mut end = header_idx + 1;
    for (j, line) in lines.iter().enumerate().skip(header_idx + 1) {
        if is_blank(line.text) {
            end = j + 1;
            continue;
        }
        let indent = indent_width(line.text);
        match block_indent {
            None => {
                if indent > header_indent {
                    block_indent = Some(indent);
                    end = j + 1;
                } else {
                    break;
                }
            }
            Some(required) => {
                if indent >= required {
                    end = j + 1;
                } else {
                    break;
                }
            }
        }
    }
    (&lines[header_idx + 1..end], block_indent)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(block: &[Line<'a>]) -> Vec<&'a str> {
        block.iter().map(|l| l.text).collect()
    }

    // -- indentation --

    #[test]
    fn indent_width_spaces() {
        assert_eq!(indent_width("x"), 0);
        assert_eq!(indent_width("  x"), 2);
        assert_eq!(indent_width("    "), 4);
    }

    #[test]
    fn indent_width_tab_stops() {
        assert_eq!(indent_width("\tx"), 4);
        assert_eq!(indent_width("\t\tx"), 8);
        assert_eq!(indent_width("  \tx"), 4);
        assert_eq!(indent_width("    \tx"), 8);
        assert_eq!(indent_width("\t  x"), 6);
    }

    // -- comments --

    #[test]
    fn strip_comment_basic() {
        assert_eq!(strip_comment("Point 1 2 // note"), "Point 1 2 ");
        assert_eq!(strip_comment("// whole line"), "");
        assert_eq!(strip_comment("no comment"), "no comment");
    }

    #[test]
    fn strip_comment_respects_quotes() {
        assert_eq!(strip_comment("Text 1 2 \"a//b\""), "Text 1 2 \"a//b\"");
        assert_eq!(strip_comment("Text 1 2 'a//b' // real"), "Text 1 2 'a//b' ");
    }

    #[test]
    fn single_slash_is_not_a_comment() {
        assert_eq!(strip_comment("Point 1/2 3"), "Point 1/2 3");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank("   \t"));
        assert!(is_blank("  // comment only"));
        assert!(!is_blank("Point 0 0"));
    }

    // -- block extraction --

    #[test]
    fn extracts_simple_block() {
        let lines = split_lines("rep i 3:\n    Point i 0\n    Point i 1\nPoint 9 9");
        let (block, indent) = extract_block(&lines, 0, 0);
        assert_eq!(indent, Some(4));
        assert_eq!(texts(block), vec!["    Point i 0", "    Point i 1"]);
    }

    #[test]
    fn block_carries_blank_lines() {
        let lines = split_lines("if 1:\n    Point 0 0\n\n    Point 1 1");
        let (block, indent) = extract_block(&lines, 0, 0);
        assert_eq!(indent, Some(4));
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn deeper_lines_stay_in_block() {
        // The nested header's body is carved out by the recursive pass;
        // extraction keeps everything indented past the block column.
        let lines = split_lines("rep i 2:\n    if 1:\n        Point 0 0\nPoint 9 9");
        let (block, indent) = extract_block(&lines, 0, 0);
        assert_eq!(indent, Some(4));
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn missing_block_yields_no_column() {
        let lines = split_lines("rep i 3:\nPoint 9 9");
        let (block, indent) = extract_block(&lines, 0, 0);
        assert_eq!(indent, None);
        assert!(block.is_empty());
    }

    #[test]
    fn header_at_end_of_script() {
        let lines = split_lines("rep i 3:");
        let (block, indent) = extract_block(&lines, 0, 0);
        assert_eq!(indent, None);
        assert!(block.is_empty());
    }

    #[test]
    fn partial_dedent_ends_block() {
        // The 2-column line leaves the 4-column block; the caller decides
        // whether it is legal where it lands.
        let lines = split_lines("if 1:\n    Point 0 0\n  Point 1 1");
        let (block, indent) = extract_block(&lines, 0, 0);
        assert_eq!(indent, Some(4));
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn nested_header_extraction_uses_relative_indices() {
        let lines = split_lines("rep i 2:\n    if 1:\n        Point 0 0\n    Point 1 1");
        let (outer, _) = extract_block(&lines, 0, 0);
        let (inner, indent) = extract_block(outer, 0, 4);
        assert_eq!(indent, Some(8));
        assert_eq!(texts(inner), vec!["        Point 0 0"]);
    }
}
