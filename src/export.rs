use std::path::Path;

use crate::document::ResumeData;
use crate::error::{ContextError, ErrorKind};
use crate::template::TemplateRenderer;

/// A PDF together with the diagnostic output of the tool that made it.
#[derive(Debug, Clone)]
pub struct ProducedPdf {
    pub bytes: Vec<u8>,
    pub log: String,
}

/// A way of turning a résumé into PDF bytes. Implementations only read the résumé.
pub trait PdfProducer {
    /// A short name used in log messages.
    fn name(&self) -> &'static str;

    fn produce(&self, resume: &ResumeData) -> Result<ProducedPdf, ContextError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfStrategy {
    Compiler,
    Fallback,
}

/// The outcome of a PDF export.
#[derive(Debug)]
pub struct PdfExport {
    pub bytes: Vec<u8>,
    pub strategy: PdfStrategy,
    /// The compiler output, kept even when the fallback produced the PDF.
    pub compiler_log: Option<String>,
    /// Why the preferred strategy was not used, if it was tried and failed.
    pub fallback_reason: Option<ContextError>,
}

/// Produce a PDF with the preferred strategy, falling back on any failure.
///
/// The compiler log of a failed attempt is logged and returned with the export so that
/// mistakes in the LaTeX template remain visible even though the fallback succeeded.
pub fn produce_pdf(
    resume: &ResumeData,
    preferred: Option<&dyn PdfProducer>,
    fallback: &dyn PdfProducer,
) -> Result<PdfExport, ContextError> {
    let Some(preferred) = preferred else {
        log::info!("Producing the PDF with the {} strategy", fallback.name());
        let produced = fallback.produce(resume)?;
        return Ok(PdfExport {
            bytes: produced.bytes,
            strategy: PdfStrategy::Fallback,
            compiler_log: None,
            fallback_reason: None,
        });
    };

    match preferred.produce(resume) {
        Ok(produced) => Ok(PdfExport {
            bytes: produced.bytes,
            strategy: PdfStrategy::Compiler,
            compiler_log: Some(produced.log),
            fallback_reason: None,
        }),
        Err(error) => {
            log::warn!(
                "The {} strategy failed, falling back to the {} strategy: {}",
                preferred.name(),
                fallback.name(),
                error
            );
            if let Some(diagnostic_log) = &error.diagnostic_log {
                log::warn!("Output of the {} strategy:\n{}", preferred.name(), diagnostic_log);
            }
            let produced = fallback.produce(resume)?;

            Ok(PdfExport {
                bytes: produced.bytes,
                strategy: PdfStrategy::Fallback,
                compiler_log: error.diagnostic_log.clone(),
                fallback_reason: Some(error),
            })
        }
    }
}

/// Read and validate a résumé document.
pub fn load(document_path: &Path) -> Result<ResumeData, ContextError> {
    let resume = ResumeData::from_path(document_path)?;
    log::info!("Loaded the document {:?}", document_path);

    Ok(resume)
}

pub fn save_json(resume: &ResumeData, output_path: &Path) -> Result<(), ContextError> {
    let json = resume.to_json_string()?;
    write_output(output_path, json.as_bytes())?;
    log::info!("Saved the JSON document to {:?}", output_path);

    Ok(())
}

/// Render the LaTeX source and save it. A template error is fatal here, there is no fallback.
pub fn save_tex(
    resume: &ResumeData,
    renderer: &TemplateRenderer,
    output_path: &Path,
) -> Result<(), ContextError> {
    let latex_source = renderer.render(resume)?;
    write_output(output_path, latex_source.as_bytes())?;
    log::info!("Saved the LaTeX source to {:?}", output_path);

    Ok(())
}

pub fn save_pdf(
    resume: &ResumeData,
    preferred: Option<&dyn PdfProducer>,
    fallback: &dyn PdfProducer,
    output_path: &Path,
) -> Result<PdfExport, ContextError> {
    let export = produce_pdf(resume, preferred, fallback)?;
    write_output(output_path, &export.bytes)?;
    log::info!(
        "Saved the PDF ({:?} strategy, {} bytes) to {:?}",
        export.strategy,
        export.bytes.len(),
        output_path
    );

    Ok(export)
}

pub fn write_output(output_path: &Path, contents: &[u8]) -> Result<(), ContextError> {
    std::fs::write(output_path, contents).map_err(|error| {
        ContextError::with_error(
            ErrorKind::Io,
            format!("Unable to write the file {:?}", output_path),
            &error,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Failing {
        kind: ErrorKind,
        attempts: Cell<usize>,
    }

    impl PdfProducer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn produce(&self, _resume: &ResumeData) -> Result<ProducedPdf, ContextError> {
            self.attempts.set(self.attempts.get() + 1);
            Err(ContextError::with_context(self.kind, "no luck").with_log("line 1: oops".into()))
        }
    }

    struct Fixed(&'static [u8]);

    impl PdfProducer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn produce(&self, _resume: &ResumeData) -> Result<ProducedPdf, ContextError> {
            Ok(ProducedPdf {
                bytes: self.0.to_vec(),
                log: "fixed log".into(),
            })
        }
    }

    #[test]
    fn preferred_strategy_is_used_when_it_succeeds() {
        let export =
            produce_pdf(&ResumeData::default(), Some(&Fixed(b"A")), &Fixed(b"B")).unwrap();

        assert_eq!(export.bytes, b"A");
        assert_eq!(export.strategy, PdfStrategy::Compiler);
        assert_eq!(export.compiler_log.as_deref(), Some("fixed log"));
        assert!(export.fallback_reason.is_none());
    }

    #[test]
    fn failure_falls_back_once_and_keeps_the_log() {
        let preferred = Failing {
            kind: ErrorKind::Compile,
            attempts: Cell::new(0),
        };

        let export = produce_pdf(&ResumeData::default(), Some(&preferred), &Fixed(b"B")).unwrap();

        assert_eq!(preferred.attempts.get(), 1);
        assert_eq!(export.bytes, b"B");
        assert_eq!(export.strategy, PdfStrategy::Fallback);
        assert_eq!(export.compiler_log.as_deref(), Some("line 1: oops"));
        assert_eq!(export.fallback_reason.unwrap().kind, ErrorKind::Compile);
    }

    #[test]
    fn fallback_failure_is_reported() {
        let preferred = Failing {
            kind: ErrorKind::ToolNotFound,
            attempts: Cell::new(0),
        };
        let fallback = Failing {
            kind: ErrorKind::Io,
            attempts: Cell::new(0),
        };

        let error = produce_pdf(&ResumeData::default(), Some(&preferred), &fallback).unwrap_err();

        assert_eq!(error.kind, ErrorKind::Io);
    }

    #[test]
    fn without_preferred_strategy_only_the_fallback_runs() {
        let export = produce_pdf(&ResumeData::default(), None, &Fixed(b"B")).unwrap();

        assert_eq!(export.strategy, PdfStrategy::Fallback);
        assert!(export.compiler_log.is_none());
    }

    #[test]
    fn write_failure_names_the_path() {
        let directory = tempfile::tempdir().unwrap();
        let output_path = directory.path().join("missing").join("resume.json");

        let error = save_json(&ResumeData::default(), &output_path).unwrap_err();

        assert_eq!(error.kind, ErrorKind::Io);
        assert!(error.context.contains("resume.json"));
    }
}
