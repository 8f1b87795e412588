//! Backend that compiles each source by running an external command.
//!
//! The source bytes are piped to stdin and stdout becomes the output. Each
//! non-empty stderr line is reported as a problem; `file:line:col: message`
//! and `file:line: message` prefixes are parsed when present. A non-zero exit
//! status turns the source's problems into errors.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

use super::{
    CompilationProblem, CompilationResult, Compiler, CompilerSettings, ProblemHandler, ProblemSink,
};
use crate::store::{ResourceReader, ResourceStore};

/// Placeholder in arguments replaced by the source resource name.
const NAME_PLACEHOLDER: &str = "{name}";

#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
    source_extension: String,
    target_extension: String,
}

impl ProcessCompiler {
    pub fn new(
        command: &[String],
        source_extension: impl Into<String>,
        target_extension: impl Into<String>,
    ) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            source_extension: source_extension.into(),
            target_extension: target_extension.into(),
        })
    }

    fn run(&self, name: &str, input: &[u8]) -> Result<Output> {
        let args = self.args.iter().map(|a| a.replace(NAME_PLACEHOLDER, name));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program))?;

        // Stdin is fed from its own thread: a filter that echoes a large input
        // blocks on stdout until someone drains it.
        let stdin = child.stdin.take();
        std::thread::scope(|scope| -> Result<Output> {
            let feeder = stdin.map(|mut stdin| {
                scope.spawn(move || match stdin.write_all(input) {
                    // A command may exit without reading its input.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                })
            });

            let output = child
                .wait_with_output()
                .with_context(|| format!("failed to wait for `{}`", self.program))?;

            if let Some(feeder) = feeder {
                match feeder.join() {
                    Ok(written) => written
                        .with_context(|| format!("failed to write stdin to `{}`", self.program))?,
                    Err(_) => anyhow::bail!("stdin writer for `{}` panicked", self.program),
                }
            }
            Ok(output)
        })
    }
}

/// Parse one stderr line into a problem attributed to `name`.
fn parse_line(name: &str, line: &str, failed: bool) -> CompilationProblem {
    let mut problem = if failed {
        CompilationProblem::error(name, line.trim())
    } else {
        CompilationProblem::warning(name, line.trim())
    };

    let mut parts = line.splitn(4, ':');
    let (Some(_file), Some(line_no), Some(rest)) = (parts.next(), parts.next(), parts.next())
    else {
        return problem;
    };
    let Ok(line_no) = line_no.trim().parse::<u32>() else {
        return problem;
    };

    match (rest.trim().parse::<u32>(), parts.next()) {
        (Ok(column), Some(message)) => {
            problem.message = message.trim().to_string();
            problem.at(line_no, column)
        }
        _ => {
            let message = line.splitn(3, ':').nth(2).unwrap_or(rest);
            problem.message = message.trim().to_string();
            problem.at(line_no, 0)
        }
    }
}

impl Compiler for ProcessCompiler {
    fn name(&self) -> &str {
        "process"
    }

    fn source_extension(&self) -> &str {
        &self.source_extension
    }

    fn target_extension(&self) -> &str {
        &self.target_extension
    }

    fn compile_with(
        &self,
        sources: &[String],
        reader: &dyn ResourceReader,
        store: &dyn ResourceStore,
        settings: &CompilerSettings,
        handler: Option<&dyn ProblemHandler>,
    ) -> CompilationResult {
        let mut sink = ProblemSink::new(settings, handler);

        for name in sources {
            let Some(input) = reader.get_bytes(name) else {
                if !sink.report(CompilationProblem::error(name.as_str(), "source not found")) {
                    break;
                }
                continue;
            };

            let output = match self.run(name, &input) {
                Ok(output) => output,
                Err(e) => {
                    if !sink.report(CompilationProblem::error(name.as_str(), format!("{e:#}"))) {
                        break;
                    }
                    continue;
                }
            };

            let failed = !output.status.success();
            if !failed {
                store.write(&self.output_name(name), &output.stdout);
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut problems: Vec<_> = stderr
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| parse_line(name, l, failed))
                .collect();
            if failed && problems.is_empty() {
                problems.push(CompilationProblem::error(
                    name.as_str(),
                    format!("`{}` exited with {}", self.program, output.status),
                ));
            }

            if !problems.into_iter().all(|p| sink.report(p)) {
                break;
            }
        }

        sink.finish()
    }
}
