// src/tasks/mod.rs

//! Leaf task bodies.
//!
//! Each reads the files selected by a [`SourceGlob`](crate::sources::SourceGlob),
//! applies zero or one transformation and writes to a destination directory,
//! mirroring paths relative to the glob base.
//!
//! - [`copy`]: byte-identical copies (scripts, fonts, images, staging).
//! - [`style`]: Sass → CSS through `grass`; lenient by default.
//! - [`template`]: Pug → HTML through [`crate::template`].

pub mod copy;
pub mod style;
pub mod template;
