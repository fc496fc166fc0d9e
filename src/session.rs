use std::path::Path;

use crate::compiler::{CompilerPipeline, LatexCompiler};
use crate::configuration::Configuration;
use crate::document::ResumeData;
use crate::error::{ContextError, ErrorKind};
use crate::export::{self, PdfExport, PdfProducer};
use crate::form::ResumeForm;
use crate::pdf::FallbackRenderer;
use crate::template::TemplateRenderer;

/// The application context: the live document together with everything needed to export it.
///
/// A session is created once at start-up and handed to whichever surface drives it. The live
/// document is only ever replaced as a whole, either by a successful load or by committing a
/// gathered form.
#[derive(Debug)]
pub struct Session {
    resume: ResumeData,
    configuration: Configuration,
    renderer: TemplateRenderer,
    fallback: FallbackRenderer,
}

impl Session {
    /// Start a session on the default document. Fails if the configured template cannot be read.
    pub fn new(configuration: Configuration) -> Result<Self, ContextError> {
        let renderer = match &configuration.template_path {
            Some(template_path) => TemplateRenderer::from_path(template_path)?,
            None => TemplateRenderer::default(),
        };

        Ok(Session {
            resume: ResumeData::default(),
            configuration,
            renderer,
            fallback: FallbackRenderer,
        })
    }

    pub fn resume(&self) -> &ResumeData {
        &self.resume
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Replace the live document wholesale.
    pub fn replace(&mut self, resume: ResumeData) {
        self.resume = resume;
    }

    pub fn form(&self) -> ResumeForm {
        ResumeForm::from_resume(&self.resume)
    }

    /// Gather the form and make the result the live document.
    pub fn commit(&mut self, form: &ResumeForm) {
        self.replace(form.gather());
    }

    /// Load a document. On failure the live document is left untouched.
    pub fn load(&mut self, document_path: &Path) -> Result<&ResumeData, ContextError> {
        let resume = export::load(document_path)?;
        self.replace(resume);

        Ok(&self.resume)
    }

    pub fn save_json(&self, output_path: &Path) -> Result<(), ContextError> {
        export::save_json(&self.resume, output_path)
    }

    pub fn save_tex(&self, output_path: &Path) -> Result<(), ContextError> {
        export::save_tex(&self.resume, &self.renderer, output_path)
    }

    /// Export a PDF, compiling with LaTeX when enabled and drawing the fallback otherwise.
    pub fn save_pdf(&self, output_path: &Path) -> Result<PdfExport, ContextError> {
        let pipeline = self.configuration.use_compiler.then(|| CompilerPipeline {
            renderer: self.renderer.clone(),
            compiler: LatexCompiler::from_configuration(&self.configuration),
        });
        let preferred = pipeline
            .as_ref()
            .map(|pipeline| pipeline as &dyn PdfProducer);

        export::save_pdf(&self.resume, preferred, &self.fallback, output_path)
    }

    /// Run one action, turning its error into the message shown to the user.
    pub fn run<T, F>(&mut self, action: F) -> Result<T, String>
    where
        F: FnOnce(&mut Session) -> Result<T, ContextError>,
    {
        action(self).map_err(|error| {
            log::error!("{}", error);
            user_message(&error)
        })
    }
}

/// Describe an error for the person using the program.
pub fn user_message(error: &ContextError) -> String {
    let headline = match error.kind {
        ErrorKind::Validation => "The document is not valid",
        ErrorKind::ToolNotFound => "No LaTeX compiler was found",
        ErrorKind::Compile => "LaTeX compilation failed",
        ErrorKind::Render => "The LaTeX template could not be rendered",
        ErrorKind::Io => "A file could not be read or written",
    };
    format!("{}. {}", headline, error)
}
