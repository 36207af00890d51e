// src/template/parser.rs

use std::path::{Path, PathBuf};

use crate::template::TemplateError;
use crate::template::lexer::{Line, lines};

const MAX_INCLUDE_DEPTH: usize = 32;

/// Keywords of Pug's code/inheritance layer; the first word of a line.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "extends", "block", "append", "prepend", "mixin", "if", "else", "unless", "each", "for",
    "while", "case", "when", "default", "yield",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `doctype <value>`; the value is the name after the keyword.
    Doctype(String),
    Element(Element),
    /// Plain text, emitted verbatim. May span several lines. Static
    /// `#[tag ...]` inline tags are split out into sibling elements.
    Text(String),
    /// Buffered comment (`// ...`).
    Comment(String),
    /// Literal HTML line (`<...>`).
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// In render order: `id`, then `class`, then the rest in source order.
    pub attrs: Vec<Attr>,
    /// Explicit `tag/`.
    pub self_closing: bool,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Boolean attribute (`checked`, `disabled=true`).
    True,
    /// `escape` is false for `name!="..."`.
    Str { value: String, escape: bool },
}

/// Parse a template source. `base_dir` is the directory `include` paths are
/// resolved against; without it `include` is an error.
pub fn parse(source: &str, base_dir: Option<&Path>) -> Result<Vec<Node>, TemplateError> {
    parse_nested(source, base_dir, 0)
}

fn parse_nested(
    source: &str,
    base_dir: Option<&Path>,
    depth: usize,
) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        lines: lines(source)?,
        pos: 0,
        base_dir,
        depth,
    };
    parser.parse_block(None)
}

/// What follows a tag on its line.
enum Trailing<'a> {
    None,
    Text(&'a str),
    TextBlock,
    Expansion(&'a str),
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    base_dir: Option<&'a Path>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn skip_blank(&mut self) {
        while self.lines.get(self.pos).is_some_and(|l| l.is_blank()) {
            self.pos += 1;
        }
    }

    /// Parse sibling lines indented deeper than `parent_indent`.
    fn parse_block(&mut self, parent_indent: Option<usize>) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        let mut block_indent: Option<usize> = None;

        loop {
            self.skip_blank();
            let Some(line) = self.lines.get(self.pos).copied() else {
                break;
            };
            if parent_indent.is_some_and(|p| line.indent <= p) {
                break;
            }
            match block_indent {
                None => block_indent = Some(line.indent),
                Some(expected) if line.indent > expected => {
                    return Err(TemplateError::syntax(line.number, "unexpected indentation"));
                }
                Some(expected) if line.indent < expected => {
                    return Err(TemplateError::syntax(
                        line.number,
                        "inconsistent indentation: dedent does not match any outer level",
                    ));
                }
                Some(_) => {}
            }

            self.pos += 1;
            self.parse_line(line, &mut nodes)?;
        }

        Ok(nodes)
    }

    fn parse_line(&mut self, line: Line<'a>, nodes: &mut Vec<Node>) -> Result<(), TemplateError> {
        let text = line.text;

        if text.starts_with("//-") {
            self.skip_children(line.indent);
            return Ok(());
        }

        if let Some(rest) = text.strip_prefix("//") {
            let mut comment = rest.trim().to_string();
            let body = self.take_text_block(line.indent);
            if !body.is_empty() {
                if !comment.is_empty() {
                    comment.push('\n');
                }
                comment.push_str(&body);
            }
            nodes.push(Node::Comment(comment));
            return Ok(());
        }

        if let Some(rest) = text.strip_prefix('|') {
            let inline = parse_inline(strip_one_space(rest), line.number)?;
            if inline.is_empty() {
                nodes.push(Node::Text(String::new()));
            }
            nodes.extend(inline);
            return Ok(());
        }

        if text.starts_with('<') {
            // Literal HTML takes escapes but no inline tags.
            match parse_inline(text, line.number)?.as_slice() {
                [Node::Text(html)] => nodes.push(Node::Raw(html.clone())),
                _ => return Err(unsupported(line.number, "#[")),
            }
            return Ok(());
        }

        if text.starts_with('-')
            || text.starts_with('=')
            || text.starts_with("!=")
            || text.starts_with('+')
            || text.starts_with(':')
        {
            return Err(unsupported(line.number, text));
        }

        let first_word = text.split_whitespace().next().unwrap_or_default();

        if first_word == "doctype" {
            let value = text["doctype".len()..].trim();
            let value = if value.is_empty() { "html" } else { value };
            nodes.push(Node::Doctype(value.to_string()));
            return Ok(());
        }

        if first_word == "include" {
            let target = text["include".len()..].trim();
            nodes.extend(self.include(line.number, target)?);
            return Ok(());
        }

        if UNSUPPORTED_KEYWORDS.contains(&first_word) {
            return Err(unsupported(line.number, first_word));
        }

        let element = self.parse_element(text, line)?;
        nodes.push(Node::Element(element));
        Ok(())
    }

    /// Parse a tag line (possibly a `a: b: c` expansion chain). Nested lines
    /// become children of the innermost element.
    fn parse_element(&mut self, text: &'a str, line: Line<'a>) -> Result<Element, TemplateError> {
        let (mut element, trailing) = parse_tag(text, line.number)?;

        match trailing {
            Trailing::None => {
                element.children = self.parse_block(Some(line.indent))?;
            }
            Trailing::Text(inline) => {
                element.children.extend(parse_inline(inline, line.number)?);
                element.children.extend(self.parse_block(Some(line.indent))?);
            }
            Trailing::TextBlock => {
                let body = self.take_text_block(line.indent);
                element.children.extend(parse_inline(&body, line.number + 1)?);
            }
            Trailing::Expansion(rest) => {
                if rest.is_empty() {
                    return Err(TemplateError::syntax(
                        line.number,
                        "expected a tag after `:`",
                    ));
                }
                let child = self.parse_element(rest, line)?;
                element.children.push(Node::Element(child));
            }
        }

        check_content(&element, line.number)?;
        Ok(element)
    }

    fn include(&mut self, line: usize, target: &str) -> Result<Vec<Node>, TemplateError> {
        if target.is_empty() {
            return Err(TemplateError::syntax(line, "`include` needs a path"));
        }
        let Some(base_dir) = self.base_dir else {
            return Err(TemplateError::syntax(
                line,
                "`include` is only available when compiling a file",
            ));
        };
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(TemplateError::syntax(line, "includes nested too deeply"));
        }

        let mut path = base_dir.join(target);
        if path.extension().is_none() {
            path.set_extension("pug");
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| TemplateError::Include {
            line,
            path: path.clone(),
            source,
        })?;

        // Skip anything nested under the include line.
        let indent = self.lines[self.pos - 1].indent;
        self.skip_children(indent);

        if path.extension().is_some_and(|e| e == "pug") {
            let nested_base: PathBuf = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| base_dir.to_path_buf());
            parse_nested(&contents, Some(&nested_base), self.depth + 1).map_err(|source| {
                TemplateError::Included {
                    path,
                    source: Box::new(source),
                }
            })
        } else {
            Ok(vec![Node::Text(contents.trim_end().to_string())])
        }
    }

    fn skip_children(&mut self, indent: usize) {
        while let Some(line) = self.lines.get(self.pos) {
            if !line.is_blank() && line.indent <= indent {
                break;
            }
            self.pos += 1;
        }
    }

    /// Consume lines nested under `indent` as raw text, dedented to the
    /// shallowest nested line. Trailing blank lines are dropped.
    fn take_text_block(&mut self, indent: usize) -> String {
        let start = self.pos;
        self.skip_children(indent);
        let block = &self.lines[start..self.pos];

        let min_indent = block
            .iter()
            .filter(|l| !l.is_blank())
            .map(|l| l.indent)
            .min()
            .unwrap_or(0);

        let mut text_lines: Vec<&str> = block.iter().map(|l| l.dedented(min_indent)).collect();
        while text_lines.last().is_some_and(|l| l.is_empty()) {
            text_lines.pop();
        }
        text_lines.join("\n")
    }
}

/// Parse `name.class#id(attrs)/` plus whatever trails it.
fn parse_tag(text: &str, line: usize) -> Result<(Element, Trailing<'_>), TemplateError> {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() && is_tag_char(bytes[i], bytes.get(i + 1).copied()) {
        i += 1;
    }
    let name = &text[..i];
    if name.starts_with(|c: char| !c.is_ascii_alphabetic()) {
        return Err(TemplateError::syntax(line, format!("invalid tag name `{name}`")));
    }

    let mut id: Option<String> = None;
    let mut classes: Vec<String> = Vec::new();
    let mut attrs: Vec<Attr> = Vec::new();

    loop {
        match bytes.get(i) {
            Some(b'.') | Some(b'#') if bytes.get(i + 1).is_some_and(|b| is_ident_char(*b)) => {
                let marker = bytes[i];
                let start = i + 1;
                i = start;
                while i < bytes.len() && is_ident_char(bytes[i]) {
                    i += 1;
                }
                let ident = text[start..i].to_string();
                if marker == b'.' {
                    classes.push(ident);
                } else {
                    id = Some(ident);
                }
            }
            Some(b'(') => {
                i = parse_attrs(text, i + 1, line, &mut attrs)?;
            }
            _ => break,
        }
    }

    if name.is_empty() && id.is_none() && classes.is_empty() {
        return Err(TemplateError::syntax(line, format!("unexpected text `{text}`")));
    }

    let mut self_closing = false;
    if bytes.get(i) == Some(&b'/') {
        self_closing = true;
        i += 1;
    }

    let rest = &text[i..];
    let trailing = if rest.is_empty() {
        Trailing::None
    } else if rest.trim_end() == "." {
        Trailing::TextBlock
    } else if let Some(expansion) = rest.strip_prefix(':') {
        Trailing::Expansion(expansion.trim_start())
    } else if let Some(inline) = rest.strip_prefix(' ') {
        Trailing::Text(inline)
    } else if rest.starts_with('=') || rest.starts_with("!=") || rest.starts_with('&') {
        return Err(unsupported(line, rest));
    } else {
        return Err(TemplateError::syntax(
            line,
            format!("unexpected `{rest}` after tag"),
        ));
    };

    Ok((
        Element {
            name: if name.is_empty() { "div".to_string() } else { name.to_string() },
            attrs: order_attrs(id, classes, attrs),
            self_closing,
            children: Vec::new(),
        },
        trailing,
    ))
}

fn check_content(element: &Element, line: usize) -> Result<(), TemplateError> {
    if (element.self_closing || is_void(&element.name)) && !element.children.is_empty() {
        return Err(TemplateError::syntax(
            line,
            format!("`{}` is self-closing and cannot have content", element.name),
        ));
    }
    Ok(())
}

/// Split text into text nodes and `#[tag ...]` elements.
///
/// `#{...}` and `!{...}` interpolate JavaScript and are rejected. A
/// backslash before `#{`, `!{` or `#[` keeps the sequence literal. `line`
/// is the line `text` starts on; text may span several lines.
fn parse_inline(text: &str, mut line: usize) -> Result<Vec<Node>, TemplateError> {
    let mut nodes = Vec::new();
    let mut buf = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix('\\') {
            if opens_inline(after) {
                buf.push_str(&after[..2]);
                rest = &after[2..];
                continue;
            }
        }

        if rest.starts_with("#{") || rest.starts_with("!{") {
            let snippet = rest.lines().next().unwrap_or(rest);
            let end = snippet.find('}').map_or(snippet.len(), |i| i + 1);
            return Err(unsupported(line, &snippet[..end]));
        }

        if let Some(after) = rest.strip_prefix("#[") {
            let Some(close) = closing_bracket(after) else {
                return Err(TemplateError::syntax(line, "unterminated `#[` inline tag"));
            };
            if !buf.is_empty() {
                nodes.push(Node::Text(std::mem::take(&mut buf)));
            }
            nodes.push(Node::Element(inline_tag(&after[..close], line)?));
            line += after[..close].matches('\n').count();
            rest = &after[close + 1..];
            continue;
        }

        if c == '\n' {
            line += 1;
        }
        buf.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if !buf.is_empty() {
        nodes.push(Node::Text(buf));
    }
    Ok(nodes)
}

fn opens_inline(s: &str) -> bool {
    s.starts_with("#{") || s.starts_with("!{") || s.starts_with("#[")
}

/// The body of `#[...]`: a tag, optionally followed by text or `: tag`.
fn inline_tag(source: &str, line: usize) -> Result<Element, TemplateError> {
    let (mut element, trailing) = parse_tag(source.trim(), line)?;
    match trailing {
        Trailing::None => {}
        Trailing::Text(text) => element.children = parse_inline(text, line)?,
        Trailing::Expansion(rest) if !rest.is_empty() => {
            element.children.push(Node::Element(inline_tag(rest, line)?));
        }
        Trailing::Expansion(_) | Trailing::TextBlock => {
            return Err(TemplateError::syntax(
                line,
                format!("unexpected `{source}` in inline tag"),
            ));
        }
    }
    check_content(&element, line)?;
    Ok(element)
}

/// Index of the `]` closing an inline tag, skipping nested brackets and
/// quoted attribute values.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            '"' | '\'' | '`' if parens > 0 => quote = Some(c),
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Parse attributes starting just after `(`. Returns the index after `)`.
fn parse_attrs(
    text: &str,
    mut i: usize,
    line: usize,
    attrs: &mut Vec<Attr>,
) -> Result<usize, TemplateError> {
    let bytes = text.as_bytes();

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b',') {
            i += 1;
        }
        match bytes.get(i) {
            None => return Err(TemplateError::syntax(line, "unterminated attribute list")),
            Some(b')') => return Ok(i + 1),
            Some(_) => {}
        }

        let start = i;
        while i < bytes.len() && !matches!(bytes[i], b' ' | b'\t' | b'=' | b',' | b')' | b'!') {
            i += 1;
        }
        let name = text[start..i].to_string();
        if name.is_empty() {
            return Err(TemplateError::syntax(
                line,
                format!("expected attribute name at `{}`", &text[i..]),
            ));
        }

        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }

        let escape = match (bytes.get(i), bytes.get(i + 1)) {
            (Some(b'!'), Some(b'=')) => {
                i += 2;
                Some(false)
            }
            (Some(b'='), _) => {
                i += 1;
                Some(true)
            }
            _ => None,
        };

        let Some(escape) = escape else {
            attrs.push(Attr {
                name,
                value: AttrValue::True,
            });
            continue;
        };

        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }

        match bytes.get(i) {
            Some(&quote) if matches!(quote, b'"' | b'\'' | b'`') => {
                let (value, next) = parse_quoted(text, i + 1, quote, line)?;
                if quote == b'`' && has_substitution(&text[i + 1..next - 1]) {
                    return Err(unsupported(line, &text[start..next]));
                }
                i = next;
                let mut peek = i;
                while peek < bytes.len() && bytes[peek] == b' ' {
                    peek += 1;
                }
                if bytes.get(peek) == Some(&b'+') {
                    return Err(unsupported(line, &text[start..]));
                }
                attrs.push(Attr {
                    name,
                    value: AttrValue::Str { value, escape },
                });
            }
            _ => {
                let token_start = i;
                while i < bytes.len() && !matches!(bytes[i], b' ' | b'\t' | b',' | b')') {
                    i += 1;
                }
                let token = &text[token_start..i];
                match token {
                    "true" => attrs.push(Attr {
                        name,
                        value: AttrValue::True,
                    }),
                    "false" => {}
                    _ if is_number(token) => attrs.push(Attr {
                        name,
                        value: AttrValue::Str {
                            value: token.to_string(),
                            escape,
                        },
                    }),
                    _ => return Err(unsupported(line, token)),
                }
            }
        }
    }
}

/// Read a quoted string starting after the opening quote. Returns the
/// unescaped value and the index after the closing quote.
fn parse_quoted(
    text: &str,
    start: usize,
    quote: u8,
    line: usize,
) -> Result<(String, usize), TemplateError> {
    let mut value = String::new();
    let mut chars = text[start..].char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c as u32 == quote as u32 => return Ok((value, start + offset + 1)),
            c => value.push(c),
        }
    }

    Err(TemplateError::syntax(line, "unterminated string in attribute"))
}

/// `id` first, then a merged `class`, then the rest in source order.
fn order_attrs(mut id: Option<String>, mut classes: Vec<String>, attrs: Vec<Attr>) -> Vec<Attr> {
    let mut rest = Vec::with_capacity(attrs.len());
    for attr in attrs {
        match (attr.name.as_str(), &attr.value) {
            ("class", AttrValue::Str { value, .. }) => {
                classes.extend(value.split_whitespace().map(str::to_string));
            }
            ("id", AttrValue::Str { value, .. }) => id = Some(value.clone()),
            _ => rest.push(attr),
        }
    }

    let mut ordered = Vec::with_capacity(rest.len() + 2);
    if let Some(id) = id {
        ordered.push(Attr {
            name: "id".to_string(),
            value: AttrValue::Str {
                value: id,
                escape: true,
            },
        });
    }
    if !classes.is_empty() {
        ordered.push(Attr {
            name: "class".to_string(),
            value: AttrValue::Str {
                value: classes.join(" "),
                escape: true,
            },
        });
    }
    ordered.extend(rest);
    ordered
}

/// Elements that never have content in HTML.
pub fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_tag_char(b: u8, next: Option<u8>) -> bool {
    // `:` belongs to the name (`svg:rect`) unless it starts an expansion.
    b.is_ascii_alphanumeric()
        || b == b'-'
        || b == b'_'
        || (b == b':' && next.is_some_and(|n| n.is_ascii_alphanumeric()))
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_number(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && token.parse::<f64>().is_ok()
}

/// `${` in a template literal, unless written `\${`.
fn has_substitution(raw: &str) -> bool {
    raw.match_indices("${").any(|(i, _)| !raw[..i].ends_with('\\'))
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

fn unsupported(line: usize, construct: &str) -> TemplateError {
    TemplateError::Unsupported {
        line,
        construct: construct.trim().to_string(),
    }
}
