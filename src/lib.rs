//! cvtex turns a résumé, described by a JSON document, into LaTeX source and PDF files.
//!
//! The résumé is represented by the struct `ResumeData`, which can be loaded from and saved to
//! JSON without loss. A PDF is produced by rendering the résumé through a LaTeX template and
//! compiling it with `pdflatex`; when no compiler is available, or the compilation fails, a plain
//! one-page PDF is drawn directly from the résumé instead.

/// The module where the résumé data model is defined.
///
/// The root of the model is `ResumeData`, which holds the six section headings and the ordered lists
/// of education, experience, skill, project and award entries. Every field has a default, so that
/// a partial JSON document is still a valid résumé, while a value of the wrong type is rejected
/// as a validation error that reports what serde_json complained about.
pub mod document;

/// This module contains the `ContextError` type which is the error type used throughout this library.
///
/// Every error carries an `ErrorKind`, a message describing what was being done, the message
/// of the error that caused it, if any, and for compilation failures the output of the compiler.
pub mod error;

/// Export settings read from a JSON configuration file.
pub mod configuration;

/// The module where the résumé is rendered into LaTeX source through a template.
///
/// Templates are written with angle-bracket delimiters (`<< >>`, `<% %>` and `<# #>`) so that
/// the braces and percent signs of LaTeX never need escaping. See `TemplateRenderer`.
pub mod template;

/// Locating and running the external LaTeX compiler.
///
/// The compiler is searched for in the configured path, then in `PATH`, then in the usual
/// installation directories of the current operating system. Each compilation runs in a scratch
/// directory of its own, under a timeout, and the directory is removed afterwards.
pub mod compiler;

/// The module where the fallback PDF is drawn.
///
/// # Introduction
///
/// The main component of this module is the struct `PdfDocument`, a thin layer over `lopdf` that
/// writes lines of text in the standard Helvetica fonts onto pages. `layout_resume` walks the résumé
/// and lays it out as a list of lines on a single US Letter page, which `FallbackRenderer` then draws.
/// The resulting documents carry fixed identifiers and timestamps, so the same résumé always gives
/// the same bytes.
pub mod pdf;

/// The commands offered to an editor: load a document and save it as JSON, LaTeX or PDF.
pub mod export;

/// Editable form state with stable entry identifiers and a pure gathering step.
pub mod form;

/// The application context that owns the live résumé.
pub mod session;

pub use document::ResumeData;
pub use error::{ContextError, ErrorKind};
pub use session::Session;
