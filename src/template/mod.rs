// src/template/mod.rs

//! Compiler for the static subset of Pug.
//!
//! Templates are compiled without evaluating JavaScript: doctypes, tags with
//! class/id shorthand and attribute lists, inline/piped/block text, `#[tag]`
//! inline tags, literal HTML, comments and `include` are supported. Code
//! lines, buffered code, interpolation, mixins, conditionals, loops and
//! template inheritance are rejected with [`TemplateError::Unsupported`].
//!
//! - [`lexer`] splits a source into indented lines.
//! - [`parser`] builds the node tree.
//! - [`render`] prints HTML, pretty or compact.

pub mod lexer;
pub mod parser;
pub mod render;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::TemplateSection;

pub use parser::{Attr, AttrValue, Element, Node, parse};
pub use render::{Doctype, render};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unsupported construct `{construct}` (templates are compiled without JavaScript)")]
    Unsupported { line: usize, construct: String },

    #[error("line {line}: cannot include {}: {source}", path.display())]
    Include {
        line: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("in {}: {source}", path.display())]
    Included {
        path: PathBuf,
        #[source]
        source: Box<TemplateError>,
    },

    #[error("reading template: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line of the innermost error, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            TemplateError::Syntax { line, .. }
            | TemplateError::Unsupported { line, .. }
            | TemplateError::Include { line, .. } => Some(*line),
            TemplateError::Included { source, .. } => source.line(),
            TemplateError::Io(_) => None,
        }
    }
}

/// Compiler options; `doctype` applies when a document declares none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub doctype: String,
    pub pretty: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            doctype: "html".to_string(),
            pretty: true,
        }
    }
}

impl From<&TemplateSection> for CompileOptions {
    fn from(section: &TemplateSection) -> Self {
        Self {
            doctype: section.doctype.clone(),
            pretty: section.pretty,
        }
    }
}

/// Compile a template source with no file context (`include` fails).
pub fn compile_str(source: &str, options: &CompileOptions) -> Result<String, TemplateError> {
    let nodes = parse(source, None)?;
    Ok(render(&nodes, options))
}

/// Compile a template file. `include` paths resolve against its directory.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<String, TemplateError> {
    let source = std::fs::read_to_string(path)?;
    let nodes = parse(&source, path.parent())?;
    Ok(render(&nodes, options))
}
