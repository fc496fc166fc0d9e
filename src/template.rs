use std::path::Path;

use minijinja::{syntax::SyntaxConfig, AutoEscape, Environment, UndefinedBehavior};

use crate::document::ResumeData;
use crate::error::{ContextError, ErrorKind};

/// The LaTeX template shipped with the crate.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/resume.tex.j2");

const TEMPLATE_NAME: &str = "resume.tex";

/// Renders a `ResumeData` into LaTeX source through a template.
///
/// Templates use `<< >>` for variables, `<% %>` for blocks and `<# #>` for comments,
/// none of which LaTeX uses on its own. Values are inserted verbatim: there is no
/// auto-escaping, so LaTeX markup in the document reaches the output unchanged.
/// A reference to a field that is not part of the document model is a render error.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    source: String,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        TemplateRenderer {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl TemplateRenderer {
    /// Use the given template source instead of the built-in one. The template is parsed
    /// immediately so that syntax errors surface here rather than at export time.
    pub fn with_template<S: Into<String>>(source: S) -> Result<Self, ContextError> {
        let renderer = TemplateRenderer {
            source: source.into(),
        };
        renderer.environment()?;

        Ok(renderer)
    }

    pub fn from_path(template_path: &Path) -> Result<Self, ContextError> {
        let source = std::fs::read_to_string(template_path).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Io,
                format!("Unable to read the template {:?}", template_path),
                &error,
            )
        })?;
        log::debug!("Loaded the template {:?}", template_path);

        TemplateRenderer::with_template(source)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the résumé into LaTeX source.
    pub fn render(&self, resume: &ResumeData) -> Result<String, ContextError> {
        let environment = self.environment()?;
        let template = environment.get_template(TEMPLATE_NAME).map_err(|error| {
            ContextError::with_error(ErrorKind::Render, "Unable to find the template", &error)
        })?;
        let rendered = template.render(resume).map_err(|error| {
            ContextError::with_error(ErrorKind::Render, "Unable to render the template", &error)
        })?;
        log::debug!("Rendered {} bytes of LaTeX source", rendered.len());

        Ok(rendered)
    }

    fn environment(&self) -> Result<Environment<'_>, ContextError> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("<%", "%>")
            .variable_delimiters("<<", ">>")
            .comment_delimiters("<#", "#>")
            .build()
            .map_err(|error| {
                ContextError::with_error(
                    ErrorKind::Render,
                    "Unable to configure the template delimiters",
                    &error,
                )
            })?;

        let mut environment = Environment::new();
        environment.set_syntax(syntax);
        environment.set_auto_escape_callback(|_| AutoEscape::None);
        environment.set_undefined_behavior(UndefinedBehavior::Strict);
        environment.set_trim_blocks(true);
        environment.set_lstrip_blocks(true);
        environment
            .add_template(TEMPLATE_NAME, &self.source)
            .map_err(|error| {
                ContextError::with_error(ErrorKind::Render, "Unable to parse the template", &error)
            })?;

        Ok(environment)
    }
}
