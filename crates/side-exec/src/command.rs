use std::process::Command;
use std::process::Stdio;

use crate::contracts::CommandOutput;
use crate::contracts::CommandRequest;
use crate::error::HostError;

/// Runs one command to completion through the shell and returns its
/// combined, escape-stripped output. A non-zero exit is reported through
/// `is_error`, not as a [`HostError`].
pub fn run_command(request: &CommandRequest) -> Result<CommandOutput, HostError> {
    let mut cmd = shell_command(request.shell.as_deref(), &request.command);
    if let Some(cwd) = &request.cwd {
        cmd.current_dir(cwd);
    }
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| HostError::CommandExecution {
            command: request.command.clone(),
            source,
        })?;

    let stdout = strip_ansi_sequences(&String::from_utf8_lossy(&output.stdout));
    let stderr = strip_ansi_sequences(&String::from_utf8_lossy(&output.stderr));
    let mut text = stdout.trim_end().to_string();
    let stderr = stderr.trim_end();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }

    let is_error = !output.status.success();
    if is_error && text.is_empty() {
        text = format!("command exited with {}", output.status);
    }
    tracing::debug!(command = %request.command, status = %output.status, "command finished");
    Ok(CommandOutput {
        output: text,
        is_error,
    })
}

fn shell_command(shell: Option<&str>, command: &str) -> Command {
    let (program, flag) = if cfg!(windows) {
        (shell.unwrap_or("cmd"), "/C")
    } else {
        (shell.unwrap_or("sh"), "-c")
    };
    let mut cmd = Command::new(program);
    cmd.arg(flag).arg(command);
    cmd
}

/// Drops CSI and OSC escape sequences and carriage returns. Output is shown
/// as plain text, never interpreted.
pub fn strip_ansi_sequences(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    let _ = chars.next();
                    for n in chars.by_ref() {
                        if ('@'..='~').contains(&n) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    let _ = chars.next();
                    while let Some(n) = chars.next() {
                        if n == '\u{7}' {
                            break;
                        }
                        if n == '\u{1b}' && chars.peek() == Some(&'\\') {
                            let _ = chars.next();
                            break;
                        }
                    }
                }
                _ => {
                    let _ = chars.next();
                }
            }
            continue;
        }
        if c == '\r' {
            continue;
        }
        out.push(c);
    }
    out
}
