// src/template/render.rs

use crate::template::CompileOptions;
use crate::template::parser::{AttrValue, Element, Node, is_void};

const INDENT: &str = "  ";

/// A resolved doctype: its declaration plus the rendering mode it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub declaration: String,
    /// HTML5 terse mode: `<br>` and bare boolean attributes.
    pub terse: bool,
    /// XML mode: void elements get no special treatment.
    pub xml: bool,
}

impl Doctype {
    pub fn from_name(name: &str) -> Self {
        let declaration = match name.trim().to_lowercase().as_str() {
            "html" => "<!DOCTYPE html>".to_string(),
            "xml" => r#"<?xml version="1.0" encoding="utf-8" ?>"#.to_string(),
            "transitional" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#.to_string(),
            "strict" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#.to_string(),
            "frameset" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#.to_string(),
            "1.1" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#.to_string(),
            "basic" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#.to_string(),
            "mobile" => r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#.to_string(),
            "plist" => r#"<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">"#.to_string(),
            _ => format!("<!DOCTYPE {}>", name.trim()),
        };
        let terse = declaration == "<!DOCTYPE html>";
        let xml = declaration.starts_with("<?xml");
        Self {
            declaration,
            terse,
            xml,
        }
    }
}

/// Render a parsed template to HTML.
///
/// The first top-level `doctype` node decides the rendering mode; without
/// one, `options.doctype` does, and is also emitted when the document root
/// is an `html` element.
pub fn render(nodes: &[Node], options: &CompileOptions) -> String {
    let declared = nodes.iter().find_map(|n| match n {
        Node::Doctype(name) => Some(name.as_str()),
        _ => None,
    });
    let doctype = Doctype::from_name(declared.unwrap_or(&options.doctype));

    let mut renderer = Renderer {
        out: String::new(),
        pretty: options.pretty,
        doctype,
    };

    let root_is_html = nodes
        .iter()
        .find_map(|n| match n {
            Node::Element(e) => Some(e.name == "html"),
            _ => None,
        })
        .unwrap_or(false);
    if declared.is_none() && root_is_html {
        renderer.out.push_str(&renderer.doctype.declaration);
    }

    renderer.nodes(nodes, 0);

    if renderer.pretty && !renderer.out.is_empty() {
        renderer.out.push('\n');
    }
    renderer.out
}

struct Renderer {
    out: String,
    pretty: bool,
    doctype: Doctype,
}

impl Renderer {
    fn newline(&mut self, depth: usize) {
        if self.pretty && !self.out.is_empty() {
            self.out.push('\n');
            for _ in 0..depth {
                self.out.push_str(INDENT);
            }
        }
    }

    /// Siblings in pretty mode each start a line, except that text and
    /// inline tags following text or an inline tag continue it. Consecutive
    /// text nodes still break.
    fn nodes(&mut self, nodes: &[Node], depth: usize) {
        let mut prev: Option<&Node> = None;
        for node in nodes {
            let continues = match (prev, node) {
                (Some(Node::Text(_)), Node::Text(_)) | (None, _) => false,
                (Some(prev), node) => is_phrasing(prev) && is_phrasing(node),
            };
            self.node(node, depth, !continues);
            prev = Some(node);
        }
    }

    fn node(&mut self, node: &Node, depth: usize, line_break: bool) {
        match node {
            Node::Doctype(_) => {
                self.newline(depth);
                let declaration = self.doctype.declaration.clone();
                self.out.push_str(&declaration);
            }
            Node::Element(element) => self.element(element, depth, line_break),
            Node::Text(text) => self.text(text, depth, line_break),
            Node::Comment(text) => {
                self.newline(depth);
                self.out.push_str("<!-- ");
                self.out.push_str(text);
                self.out.push_str(" -->");
            }
            Node::Raw(html) => {
                self.newline(depth);
                self.out.push_str(html);
            }
        }
    }

    fn text(&mut self, text: &str, depth: usize, line_break: bool) {
        if !self.pretty {
            self.out.push_str(text);
            return;
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 || line_break {
                self.newline(depth);
            }
            self.out.push_str(line);
        }
    }

    fn element(&mut self, element: &Element, depth: usize, line_break: bool) {
        if line_break {
            self.newline(depth);
        }
        self.open_tag(element);

        let void = !self.doctype.xml && is_void(&element.name);
        if element.self_closing || void {
            if self.doctype.terse && !element.self_closing {
                self.out.push('>');
            } else {
                self.out.push_str("/>");
            }
            return;
        }
        self.out.push('>');

        match element.children.as_slice() {
            [] => {}
            children if is_whitespace_sensitive(&element.name) || fits_on_one_line(children) => {
                let pretty = self.pretty;
                self.pretty = false;
                self.nodes(children, 0);
                self.pretty = pretty;
            }
            children => {
                self.nodes(children, depth + 1);
                self.newline(depth);
            }
        }

        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }

    fn open_tag(&mut self, element: &Element) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for attr in &element.attrs {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            match &attr.value {
                AttrValue::True => {
                    if !self.doctype.terse {
                        self.out.push_str("=\"");
                        self.out.push_str(&attr.name);
                        self.out.push('"');
                    }
                }
                AttrValue::Str { value, escape } => {
                    self.out.push_str("=\"");
                    if *escape {
                        self.out.push_str(&escape_attr(value));
                    } else {
                        self.out.push_str(value);
                    }
                    self.out.push('"');
                }
            }
        }
    }
}

fn is_whitespace_sensitive(name: &str) -> bool {
    matches!(name, "pre" | "textarea")
}

/// Phrasing tags that print inline with surrounding text.
fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr"
            | "acronym"
            | "b"
            | "br"
            | "code"
            | "em"
            | "font"
            | "i"
            | "img"
            | "ins"
            | "kbd"
            | "map"
            | "samp"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
    )
}

fn is_phrasing(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(element) => is_inline(&element.name),
        _ => false,
    }
}

/// Single-line text and inline tags (recursively), with no two text nodes
/// in a row.
fn fits_on_one_line(children: &[Node]) -> bool {
    let adjacent_text = children
        .windows(2)
        .any(|pair| matches!(pair, [Node::Text(_), Node::Text(_)]));
    !adjacent_text
        && children.iter().all(|child| match child {
            Node::Text(text) => !text.contains('\n'),
            Node::Element(element) => {
                is_inline(&element.name) && fits_on_one_line(&element.children)
            }
            _ => false,
        })
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
