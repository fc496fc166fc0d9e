use std::{
    ffi::OsString,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc,
    time::{Duration, Instant},
};

use crate::configuration::{Configuration, COMPILER_ENVIRONMENT_VARIABLE};
use crate::document::ResumeData;
use crate::error::{ContextError, ErrorKind};
use crate::export::{PdfProducer, ProducedPdf};
use crate::template::TemplateRenderer;

/// The executable name looked up on the `PATH`.
pub const COMPILER_NAME: &str = if cfg!(windows) {
    "pdflatex.exe"
} else {
    "pdflatex"
};

const SOURCE_FILE_NAME: &str = "resume.tex";
const ARTIFACT_FILE_NAME: &str = "resume.pdf";
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Installation paths of the common TeX distributions for the current operating system.
pub fn well_known_compiler_paths() -> Vec<PathBuf> {
    let candidates: Vec<&str> = if cfg!(windows) {
        vec![
            r"C:\Program Files\MiKTeX\miktex\bin\x64\pdflatex.exe",
            r"C:\Program Files\MiKTeX\miktex\bin\pdflatex.exe",
            r"C:\Program Files\MiKTeX 2.9\miktex\bin\x64\pdflatex.exe",
            r"C:\texlive\2024\bin\windows\pdflatex.exe",
            r"C:\texlive\2023\bin\windows\pdflatex.exe",
            r"C:\texlive\2022\bin\windows\pdflatex.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Library/TeX/texbin/pdflatex",
            "/usr/local/texlive/2024/bin/universal-darwin/pdflatex",
            "/usr/local/texlive/2023/bin/universal-darwin/pdflatex",
            "/opt/homebrew/bin/pdflatex",
            "/usr/local/bin/pdflatex",
        ]
    } else {
        vec![
            "/usr/bin/pdflatex",
            "/usr/local/bin/pdflatex",
            "/usr/local/texlive/2024/bin/x86_64-linux/pdflatex",
            "/usr/local/texlive/2023/bin/x86_64-linux/pdflatex",
            "/usr/local/texlive/2022/bin/x86_64-linux/pdflatex",
        ]
    };

    candidates.into_iter().map(PathBuf::from).collect()
}

/// Finds the LaTeX compiler: the explicit override first, then the directories of the
/// search path, then the well-known installation paths.
#[derive(Debug, Clone, Default)]
pub struct CompilerLocator {
    pub override_path: Option<PathBuf>,
    pub search_path: Option<OsString>,
    pub well_known_paths: Vec<PathBuf>,
}

impl CompilerLocator {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        CompilerLocator {
            override_path: configuration.compiler_path.clone(),
            search_path: std::env::var_os("PATH"),
            well_known_paths: well_known_compiler_paths(),
        }
    }

    /// Only consider the given executable.
    pub fn exactly(compiler_path: PathBuf) -> Self {
        CompilerLocator {
            override_path: Some(compiler_path),
            ..Default::default()
        }
    }

    pub fn locate(&self) -> Result<PathBuf, ContextError> {
        if let Some(override_path) = &self.override_path {
            if override_path.is_file() {
                log::debug!("Using the compiler {:?} from the override", override_path);
                return Ok(override_path.clone());
            }
            log::warn!(
                "The compiler override {:?} does not exist, searching elsewhere",
                override_path
            );
        }

        if let Some(search_path) = &self.search_path {
            for directory in std::env::split_paths(search_path) {
                let candidate = directory.join(COMPILER_NAME);
                if candidate.is_file() {
                    log::debug!("Found the compiler {:?} on the search path", candidate);
                    return Ok(candidate);
                }
            }
        }

        if let Some(candidate) = self
            .well_known_paths
            .iter()
            .find(|candidate| candidate.is_file())
        {
            log::debug!("Found the compiler {:?} in a well-known location", candidate);
            return Ok(candidate.clone());
        }

        let message = format!(
            "{} not found, install MiKTeX or TeX Live or set {}",
            COMPILER_NAME, COMPILER_ENVIRONMENT_VARIABLE
        );
        Err(ContextError::with_context(ErrorKind::ToolNotFound, message.clone()).with_log(message))
    }
}

/// Runs the LaTeX compiler over a source file in a scratch directory of its own.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    pub locator: CompilerLocator,
    pub timeout: Duration,
}

impl LatexCompiler {
    pub fn new(locator: CompilerLocator, timeout: Duration) -> Self {
        LatexCompiler { locator, timeout }
    }

    pub fn from_configuration(configuration: &Configuration) -> Self {
        LatexCompiler::new(
            CompilerLocator::from_configuration(configuration),
            configuration.compile_timeout(),
        )
    }

    /// Compile the LaTeX source into PDF bytes, returned together with the compiler output.
    ///
    /// The compilation fails when the compiler cannot be found, exits with a non-zero status,
    /// exits without producing a PDF or runs longer than the timeout. The scratch directory
    /// is deleted in every case.
    pub fn compile(&self, latex_source: &str) -> Result<ProducedPdf, ContextError> {
        let compiler_path = self.locator.locate()?;

        let scratch_directory = tempfile::Builder::new()
            .prefix("cvtex-")
            .tempdir()
            .map_err(|error| {
                ContextError::with_error(
                    ErrorKind::Io,
                    "Unable to create the scratch directory",
                    &error,
                )
            })?;
        log::debug!("Compiling in the scratch directory {:?}", scratch_directory.path());

        let outcome = self.compile_in(&compiler_path, scratch_directory.path(), latex_source);

        let scratch_directory_path = scratch_directory.path().to_path_buf();
        if let Err(error) = scratch_directory.close() {
            log::warn!(
                "Unable to remove the scratch directory {:?}: {}",
                scratch_directory_path,
                error
            );
        }

        outcome
    }

    fn compile_in(
        &self,
        compiler_path: &Path,
        scratch_directory: &Path,
        latex_source: &str,
    ) -> Result<ProducedPdf, ContextError> {
        let source_path = scratch_directory.join(SOURCE_FILE_NAME);
        std::fs::write(&source_path, latex_source).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Io,
                format!("Unable to write the LaTeX source {:?}", source_path),
                &error,
            )
        })?;

        let mut command = Command::new(compiler_path);
        command
            .arg("-interaction=nonstopmode")
            .arg(SOURCE_FILE_NAME)
            .current_dir(scratch_directory);
        let (status, log) = run_with_timeout(&mut command, self.timeout)?;

        let Some(status) = status else {
            return Err(ContextError::with_context(
                ErrorKind::Compile,
                format!(
                    "{:?} did not finish within {} seconds and was stopped",
                    compiler_path,
                    self.timeout.as_secs_f32()
                ),
            )
            .with_log(log));
        };

        let artifact_path = scratch_directory.join(ARTIFACT_FILE_NAME);
        if !status.success() {
            return Err(ContextError::with_context(
                ErrorKind::Compile,
                format!("{:?} failed with {}", compiler_path, status),
            )
            .with_log(log));
        }
        if !artifact_path.is_file() {
            return Err(ContextError::with_context(
                ErrorKind::Compile,
                format!("{:?} exited successfully but produced no PDF", compiler_path),
            )
            .with_log(log));
        }

        let bytes = std::fs::read(&artifact_path).map_err(|error| {
            ContextError::with_error(
                ErrorKind::Io,
                format!("Unable to read the compiled PDF {:?}", artifact_path),
                &error,
            )
            .with_log(log.clone())
        })?;
        log::info!("Compiled {} bytes of PDF with {:?}", bytes.len(), compiler_path);

        Ok(ProducedPdf { bytes, log })
    }
}

/// Run the command with its output captured, killing it once the timeout has elapsed.
/// Returns the exit status, or `None` if the command was killed, together with the
/// standard output followed by the standard error.
///
/// On Unix the command leads a process group of its own and the whole group is killed,
/// so helpers it started cannot outlive the timeout. Output still held open by a helper
/// is read for at most `OUTPUT_GRACE` once the deadline has passed.
fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
) -> Result<(Option<ExitStatus>, String), ContextError> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        command.process_group(0);
    }
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| {
            ContextError::with_error(ErrorKind::Compile, "Unable to run the compiler", &error)
        })?;

    // Both pipes are drained while waiting, otherwise a chatty compiler blocks on a full pipe
    let (output_sender, output_receiver) = mpsc::channel();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_sender = output_sender.clone();
    std::thread::spawn(move || stdout_sender.send(OutputStream::Stdout(read_lossy(stdout))));
    std::thread::spawn(move || output_sender.send(OutputStream::Stderr(read_lossy(stderr))));

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if started.elapsed() >= timeout => {
                log::warn!("The compiler exceeded {:?}, stopping it", timeout);
                kill_process_group(&mut child);
                let _ = child.wait();
                break None;
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(error) => {
                kill_process_group(&mut child);
                return Err(ContextError::with_error(
                    ErrorKind::Compile,
                    "Unable to wait for the compiler",
                    &error,
                ));
            }
        }
    };

    let deadline = (started + timeout).max(Instant::now() + OUTPUT_GRACE);
    let mut stdout = String::new();
    let mut stderr = String::new();
    for _ in 0..2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match output_receiver.recv_timeout(remaining) {
            Ok(OutputStream::Stdout(output)) => stdout = output,
            Ok(OutputStream::Stderr(output)) => stderr = output,
            Err(_) => {
                log::warn!("The compiler output is still open, it is left unread");
                break;
            }
        }
    }

    Ok((status, format!("{}\n{}", stdout, stderr)))
}

enum OutputStream {
    Stdout(String),
    Stderr(String),
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    // The group id is the pid of its leader
    let killed = Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{}", child.id()))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    if !killed {
        log::warn!("Unable to stop the compiler process group, stopping the compiler only");
    }
    if let Err(error) = child.kill() {
        log::debug!("Unable to stop the compiler: {}", error);
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    if let Err(error) = child.kill() {
        log::warn!("Unable to stop the compiler: {}", error);
    }
}

fn read_lossy<R: Read>(pipe: Option<R>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(error) = pipe.read_to_end(&mut buffer) {
            log::warn!("Unable to read the compiler output: {}", error);
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// The preferred PDF strategy: render the template, then compile it with LaTeX.
#[derive(Debug, Clone)]
pub struct CompilerPipeline {
    pub renderer: TemplateRenderer,
    pub compiler: LatexCompiler,
}

impl PdfProducer for CompilerPipeline {
    fn name(&self) -> &'static str {
        "latex"
    }

    fn produce(&self, resume: &ResumeData) -> Result<ProducedPdf, ContextError> {
        let latex_source = self.renderer.render(resume)?;
        self.compiler.compile(&latex_source)
    }
}
