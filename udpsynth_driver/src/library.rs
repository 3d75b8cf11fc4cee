//! Locating primitive definitions inside larger Verilog sources.

use std::ops::Range;

use regex::Regex;

/// Matches a whole `primitive ... endprimitive` block starting on its own line.
const BLOCK_PATTERN: &str =
    r"(?ms)^[ \t]*primitive\s+([A-Za-z_][A-Za-z0-9_$]*)\b.*?\bendprimitive\b";

/// String literals, which are kept, then line and block comments.
const COMMENT_PATTERN: &str = r#""(?:[^"\\\n]|\\.)*"|//[^\n]*|(?s:/\*.*?\*/)"#;

/// One primitive definition found in a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveBlock {
    /// Name following the `primitive` keyword.
    pub name: String,
    /// Byte range of the block, from the start of its first line through
    /// `endprimitive`.
    pub span: Range<usize>,
    /// 1-based line on which the block starts.
    pub line: usize,
}

impl PrimitiveBlock {
    /// Source text of the block.
    #[must_use]
    pub fn source<'a>(&self, text: &'a str) -> &'a str {
        &text[self.span.clone()]
    }
}

/// Blanks out comments, keeping every byte offset and line break, so that
/// keywords inside comments are not taken for block boundaries.
fn mask_comments(text: &str) -> Result<String, regex::Error> {
    let comment_regex = Regex::new(COMMENT_PATTERN)?;
    let mut masked = String::with_capacity(text.len());
    let mut copied = 0;
    for found in comment_regex.find_iter(text) {
        masked.push_str(&text[copied..found.start()]);
        if found.as_str().starts_with('"') {
            masked.push_str(found.as_str());
        } else {
            for c in found.as_str().chars() {
                match c {
                    '\n' => masked.push('\n'),
                    other => masked.extend(std::iter::repeat_n(' ', other.len_utf8())),
                }
            }
        }
        copied = found.end();
    }
    masked.push_str(&text[copied..]);
    Ok(masked)
}

/// Finds every primitive definition in `text`, in source order. Comments
/// are ignored when looking for `primitive` and `endprimitive`.
///
/// # Errors
///
/// Returns the `regex` error if a scanning pattern fails to compile.
pub fn scan_library(text: &str) -> Result<Vec<PrimitiveBlock>, regex::Error> {
    let block_regex = Regex::new(BLOCK_PATTERN)?;
    let masked = mask_comments(text)?;

    let mut blocks = Vec::new();
    let mut line = 1;
    let mut counted = 0;
    for captures in block_regex.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        line += text[counted..whole.start()].matches('\n').count();
        counted = whole.start();
        blocks.push(PrimitiveBlock {
            name: name.as_str().to_string(),
            span: whole.range(),
            line,
        });
    }
    tracing::trace!("found {} primitive blocks", blocks.len());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_blocks_between_modules() {
        let text = "module top; endmodule\n\nprimitive inv (y, a);\n  output y; input a;\n  table 0 : 1 ; 1 : 0 ; endtable\nendprimitive\n  primitive buf_p(y, a); output y; input a; table 0:0; endtable endprimitive\n";
        let blocks = scan_library(text).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "inv");
        assert_eq!(blocks[0].line, 3);
        assert!(blocks[0].source(text).starts_with("primitive inv"));
        assert!(blocks[0].source(text).ends_with("endprimitive"));
        assert_eq!(blocks[1].name, "buf_p");
        assert_eq!(blocks[1].line, 7);
        assert!(blocks[1].source(text).starts_with("  primitive"));
    }

    #[test]
    fn test_keyword_inside_a_line_is_ignored() {
        let text = "// a primitive table follows\nwire primitive_net;\n";
        assert!(scan_library(text).unwrap().is_empty());
    }

    #[test]
    fn test_comments_do_not_delimit_blocks() {
        let text = "/*\nprimitive old (y, a);\n*/\nprimitive inv (y, a); // not the endprimitive yet\n  output y; input a;\n  table 0 : 1 ; 1 : 0 ; endtable\nendprimitive\n";
        let blocks = scan_library(text).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "inv");
        assert_eq!(blocks[0].line, 4);
        assert!(blocks[0].source(text).contains("// not the endprimitive yet"));
        assert!(blocks[0].source(text).ends_with("endtable\nendprimitive"));
    }

    #[test]
    fn test_mask_keeps_offsets_and_strings() {
        let text = "a /* é\n */ \"//kept\" // gone\nb";
        let masked = mask_comments(text).unwrap();
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked.lines().count(), text.lines().count());
        assert!(masked.contains("\"//kept\""));
        assert!(!masked.contains("gone"));
        assert!(masked.ends_with("\nb"));
    }
}
