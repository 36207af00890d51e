// src/template/lexer.rs

use crate::template::TemplateError;

/// One physical source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Count of leading space/tab characters.
    pub indent: usize,
    /// Content after indentation, trailing whitespace removed.
    pub text: &'a str,
    /// The full line, trailing whitespace removed.
    pub raw: &'a str,
}

impl Line<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// The line with the first `indent` indentation characters removed.
    /// Used for text blocks, where deeper indentation is content.
    pub fn dedented(&self, indent: usize) -> &str {
        if self.is_blank() {
            return "";
        }
        &self.raw[indent.min(self.indent)..]
    }
}

/// Split a source into lines. Blank lines are kept (text blocks need them).
///
/// A document indents with tabs or with spaces, whichever its first
/// indented line uses; a line using the other character is an error.
pub fn lines(source: &str) -> Result<Vec<Line<'_>>, TemplateError> {
    let mut indent_char: Option<u8> = None;
    let mut out = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let raw = raw.trim_end();
        let number = i + 1;
        let indent = raw
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();

        for b in raw.bytes().take(indent) {
            match indent_char {
                None => indent_char = Some(b),
                Some(expected) if expected != b => {
                    return Err(TemplateError::syntax(
                        number,
                        "invalid indentation: use tabs or spaces but not both",
                    ));
                }
                Some(_) => {}
            }
        }

        out.push(Line {
            number,
            indent,
            text: &raw[indent..],
            raw,
        });
    }

    Ok(out)
}
