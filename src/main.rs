#![warn(clippy::unwrap_used)]

use clap::{Parser, Subcommand};
use cvtex::{
    configuration::Configuration,
    error::ContextError,
    export::{self, PdfStrategy},
    session::{self, Session},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, long_about = None)]
struct CliArguments {
    #[arg(
        long = "configuration",
        value_name = "json_configuration_file",
        help = "Path to the export configuration file in the JSON format"
    )]
    configuration_file_path: Option<PathBuf>,
    #[arg(
        long = "compiler",
        help = "Path to the LaTeX compiler, taking precedence over every other setting"
    )]
    compiler_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a document holding only the default headings
    New { output_path: PathBuf },
    /// Validate a document
    Check { document_path: PathBuf },
    /// Validate a document and save it again as pretty-printed JSON
    Json {
        document_path: PathBuf,
        output_path: PathBuf,
    },
    /// Render a document into LaTeX source
    Tex {
        document_path: PathBuf,
        output_path: PathBuf,
    },
    /// Export a document as a PDF
    Pdf {
        document_path: PathBuf,
        output_path: PathBuf,
        #[arg(long = "no-compiler", help = "Draw the fallback PDF without trying LaTeX")]
        no_compiler: bool,
        #[arg(long = "compiler-log", help = "Where to save the output of the LaTeX compiler")]
        compiler_log_path: Option<PathBuf>,
    },
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", session::user_message(&error));
        if let Some(diagnostic_log) = &error.diagnostic_log {
            log::error!("Compiler output:\n{}", diagnostic_log);
        }
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli_arguments = CliArguments::parse();

    let mut configuration = match &cli_arguments.configuration_file_path {
        Some(configuration_file_path) => Configuration::from_path(configuration_file_path)?,
        None => Configuration::default(),
    }
    .with_environment_overrides()
    .with_compiler_override(cli_arguments.compiler_path);
    if let Command::Pdf {
        no_compiler: true, ..
    } = cli_arguments.command
    {
        configuration.use_compiler = false;
    }
    let mut session = Session::new(configuration)?;

    match cli_arguments.command {
        Command::New { output_path } => session.save_json(&output_path)?,
        Command::Check { document_path } => {
            let resume = session.load(&document_path)?;
            log::info!(
                "The document is valid: {} education, {} experience, {} skill, {} project and {} award entries",
                resume.education.len(),
                resume.experience.len(),
                resume.skills.len(),
                resume.projects.len(),
                resume.awards.len()
            );
        }
        Command::Json {
            document_path,
            output_path,
        } => {
            session.load(&document_path)?;
            session.save_json(&output_path)?;
        }
        Command::Tex {
            document_path,
            output_path,
        } => {
            session.load(&document_path)?;
            session.save_tex(&output_path)?;
        }
        Command::Pdf {
            document_path,
            output_path,
            compiler_log_path,
            ..
        } => {
            session.load(&document_path)?;
            let pdf_export = session.save_pdf(&output_path)?;
            if pdf_export.strategy == PdfStrategy::Fallback {
                if let Some(reason) = &pdf_export.fallback_reason {
                    log::warn!("Used the fallback layout: {}", session::user_message(reason));
                }
            }
            match (compiler_log_path, &pdf_export.compiler_log) {
                (Some(compiler_log_path), Some(compiler_log)) => {
                    export::write_output(&compiler_log_path, compiler_log.as_bytes())?;
                    log::info!("Saved the compiler output to {:?}", compiler_log_path);
                }
                (Some(_), None) => log::info!("The compiler did not run, no output to save"),
                (None, _) => {}
            }
        }
    }

    Ok(())
}
