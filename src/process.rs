//! Ownership of spawned tool processes.
//!
//! [`ToolProcess`] is acquired when a tool is spawned and guarantees on drop
//! that the process is killed and reaped, whichever way its owner goes out
//! of scope. Each process gets separate stdin, stdout, and stderr pipes;
//! stderr is drained on a helper thread into the `log` crate (target
//! `framepipe::tool`) so a chatty tool never blocks on a full pipe, and its
//! last lines are kept for error messages.
//!
//! [`ToolOutput`] and [`ToolInput`] expose a process's stdout and stdin as a
//! [`ByteSource`] and a [`ByteSink`]. Both take their pipe lazily, on the
//! first read or write.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::configuration::ToolOptions;
use crate::error::FramePipeError;
use crate::ffmpeg::Tool;
use crate::sink::{ByteSink, WriterSink};
use crate::source::{ByteSource, ReaderSource};

/// Number of stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 16;

type StderrTail = Arc<Mutex<VecDeque<String>>>;

/// A running external tool, killed and reaped on drop.
#[derive(Debug)]
pub struct ToolProcess {
    program: PathBuf,
    child: Child,
    stderr_tail: StderrTail,
    stderr_drain: Option<JoinHandle<()>>,
    reaped: bool,
}

impl ToolProcess {
    /// Spawn `tool` with `args`, all three standard streams piped.
    ///
    /// # Errors
    ///
    /// [`FramePipeError::ToolSpawn`] if the program cannot be started.
    pub fn spawn(
        tools: &ToolOptions,
        tool: Tool,
        args: &[OsString],
    ) -> Result<Self, FramePipeError> {
        let program = tools.program(tool);
        log::info!("Starting {} {}", program.display(), render_args(args));

        let child = Command::new(&program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FramePipeError::ToolSpawn {
                program: program.clone(),
                source,
            })?;

        let mut process = Self {
            program,
            child,
            stderr_tail: Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES))),
            stderr_drain: None,
            reaped: false,
        };
        if let Some(stderr) = process.child.stderr.take() {
            let handle = spawn_stderr_drain(stderr, Arc::clone(&process.stderr_tail), tool)?;
            process.stderr_drain = Some(handle);
        }
        Ok(process)
    }

    /// Resolved program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Take the write end of the tool's stdin.
    pub fn take_stdin(&mut self) -> Result<ChildStdin, FramePipeError> {
        self.child
            .stdin
            .take()
            .ok_or(FramePipeError::MissingPipe("stdin"))
    }

    /// Take the read end of the tool's stdout.
    pub fn take_stdout(&mut self) -> Result<ChildStdout, FramePipeError> {
        self.child
            .stdout
            .take()
            .ok_or(FramePipeError::MissingPipe("stdout"))
    }

    /// Close the tool's stdin without writing anything.
    pub fn close_stdin(&mut self) {
        drop(self.child.stdin.take());
    }

    /// The last lines the tool wrote to stderr, newline separated.
    pub fn stderr_tail(&self) -> String {
        self.stderr_tail
            .lock()
            .map(|tail| tail.iter().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }

    /// Wait for the tool to exit on its own.
    pub fn wait(&mut self) -> Result<ExitStatus, FramePipeError> {
        let status = self.child.wait()?;
        self.reaped = true;
        self.join_stderr_drain();
        log::info!("{} exited with {status}", self.program.display());
        Ok(status)
    }

    /// Wait for the tool to exit and turn a non-zero status into
    /// [`FramePipeError::ToolFailed`].
    pub fn wait_for_success(&mut self) -> Result<(), FramePipeError> {
        let status = self.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(FramePipeError::ToolFailed {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: self.stderr_tail(),
            })
        }
    }

    /// Kill the tool if it is still running and reap it.
    pub fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(error) = self.child.kill() {
            log::debug!("kill {} failed: {error}", self.program.display());
        }
        match self.child.wait() {
            Ok(status) => log::debug!("{} terminated ({status})", self.program.display()),
            Err(error) => log::warn!("failed to reap {}: {error}", self.program.display()),
        }
        self.reaped = true;
        self.join_stderr_drain();
    }

    fn join_stderr_drain(&mut self) {
        if let Some(handle) = self.stderr_drain.take() {
            if handle.join().is_err() {
                log::warn!("stderr reader for {} panicked", self.program.display());
            }
        }
    }
}

impl Drop for ToolProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Run `tool` to completion, capturing stdout and stderr.
pub(crate) fn run_to_completion(
    tools: &ToolOptions,
    tool: Tool,
    args: &[OsString],
) -> Result<Output, FramePipeError> {
    let program = tools.program(tool);
    log::debug!("Running {} {}", program.display(), render_args(args));
    Command::new(&program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| FramePipeError::ToolSpawn { program, source })
}

fn spawn_stderr_drain(
    stderr: ChildStderr,
    tail: StderrTail,
    tool: Tool,
) -> Result<JoinHandle<()>, FramePipeError> {
    let name = tool.program_name();
    let handle = std::thread::Builder::new()
        .name(format!("{name}-stderr"))
        .spawn(move || {
            let mut reader = BufReader::new(stderr);
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end();
                if text.is_empty() {
                    continue;
                }
                log::debug!(target: "framepipe::tool", "{name}: {text}");
                if let Ok(mut tail) = tail.lock() {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(text.to_string());
                }
            }
        })?;
    Ok(handle)
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The stdout of a decoding tool, as a [`ByteSource`].
///
/// Owns the process: dropping the output closes the pipe, then kills and
/// reaps the tool.
#[derive(Debug)]
pub struct ToolOutput {
    stdout: Option<ReaderSource<ChildStdout>>,
    process: ToolProcess,
}

impl ToolOutput {
    /// Wrap a spawned process. Its stdout is taken on the first read.
    pub fn new(process: ToolProcess) -> Self {
        Self {
            stdout: None,
            process,
        }
    }

    /// The owned process.
    pub fn process(&self) -> &ToolProcess {
        &self.process
    }

    /// Whether the first read has happened.
    pub fn is_started(&self) -> bool {
        self.stdout.is_some()
    }

    /// Finish with the tool.
    ///
    /// If the whole output was consumed, waits for the tool and reports a
    /// non-zero exit as [`FramePipeError::ToolFailed`]. Otherwise the tool is
    /// killed and `Ok(())` is returned.
    pub fn close(mut self) -> Result<(), FramePipeError> {
        let drained = self.at_end();
        drop(self.stdout.take());
        if drained {
            self.process.wait_for_success()
        } else {
            self.process.terminate();
            Ok(())
        }
    }
}

impl ByteSource for ToolOutput {
    fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.stdout.is_none() {
            let stdout = self
                .process
                .take_stdout()
                .map_err(|error| std::io::Error::new(std::io::ErrorKind::BrokenPipe, error))?;
            log::debug!("opened stdout of {}", self.process.program().display());
            self.stdout = Some(ReaderSource::new(stdout));
        }
        match self.stdout.as_mut() {
            Some(source) => source.read_chunk(buf),
            None => Ok(0),
        }
    }

    fn at_end(&self) -> bool {
        self.stdout.as_ref().is_some_and(|source| source.at_end())
    }
}

/// The stdin of an encoding tool, as a [`ByteSink`].
///
/// Closing the sink closes the pipe and waits for the tool to finish
/// writing its output.
#[derive(Debug)]
pub struct ToolInput {
    stdin: Option<WriterSink<ChildStdin>>,
    process: ToolProcess,
    closed: bool,
}

impl ToolInput {
    /// Wrap a spawned process. Its stdin is taken on the first write.
    pub fn new(process: ToolProcess) -> Self {
        Self {
            stdin: None,
            process,
            closed: false,
        }
    }

    /// The owned process.
    pub fn process(&self) -> &ToolProcess {
        &self.process
    }
}

impl ByteSink for ToolInput {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        if self.stdin.is_none() && !self.closed {
            let stdin = self
                .process
                .take_stdin()
                .map_err(|error| std::io::Error::new(std::io::ErrorKind::BrokenPipe, error))?;
            log::debug!("opened stdin of {}", self.process.program().display());
            self.stdin = Some(WriterSink::new(stdin));
        }
        match self.stdin.as_mut() {
            Some(sink) => sink.write(bytes),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "tool input is closed",
            )),
        }
    }

    fn close(&mut self) -> Result<(), FramePipeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let flushed = match self.stdin.take() {
            Some(mut sink) => sink.close(),
            None => {
                self.process.close_stdin();
                Ok(())
            }
        };
        self.process.wait_for_success()?;
        flushed
    }
}
