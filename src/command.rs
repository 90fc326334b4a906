//! External command invocation.
//!
//! The engine talks to processes through [`CommandRunner`] so tests can swap
//! in a mock. Values are written as newline-separated compact JSON, followed
//! by an end-of-transmission byte when configured; the captured output is
//! decoded as a stream of JSON values.

use crate::config::{CommandSettings, EOT};
use crate::values::{json, Exception, Value};
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};

/// Runs one external program to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Launch `program`, feed it `stdin`, and return everything it wrote to
    /// stdout. Launch failures are reported with their `io::ErrorKind` intact.
    fn run(&self, program: &str, stdin: &[u8]) -> io::Result<Vec<u8>>;
}

/// Runs programs with `std::process`, discarding stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, stdin: &[u8]) -> io::Result<Vec<u8>> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Feed stdin from a helper so a chatty child cannot deadlock us on a
        // full stdout pipe.
        let writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.to_vec();
            std::thread::spawn(move || {
                if let Err(e) = pipe.write_all(&input) {
                    tracing::debug!("command closed stdin early: {}", e);
                }
            })
        });

        let mut output = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut output)?;
        }
        if let Some(handle) = writer {
            let _ = handle.join();
        }
        let status = child.wait()?;
        tracing::debug!(program, ?status, bytes = output.len(), "command finished");
        Ok(output)
    }
}

/// Serialize `values` for a command's stdin.
pub fn encode_input(values: &[Value], settings: &CommandSettings) -> Result<Vec<u8>, Exception> {
    let mut buffer = Vec::new();
    for value in values {
        let line = json::to_json_string(value).map_err(Exception::internal)?;
        buffer.extend_from_slice(line.as_bytes());
        buffer.push(b'\n');
    }
    if settings.end_of_transmission {
        buffer.push(EOT);
    }
    Ok(buffer)
}

/// Parse a command's stdout back into values.
pub fn decode_output(bytes: &[u8], settings: &CommandSettings) -> Result<Vec<Value>, Exception> {
    let mut bytes = bytes;
    if settings.strip_trailing_eot {
        if let Some((&EOT, rest)) = bytes.split_last() {
            bytes = rest;
        }
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Exception::command_output(&format!("output is not UTF-8: {}", e)))?;
    json::parse_stream(text).map_err(|e| Exception::command_output(&e.to_string()))
}

/// Map a launch failure to its exception.
pub fn launch_error(program: &str, error: &io::Error) -> Exception {
    match error.kind() {
        io::ErrorKind::NotFound => Exception::path(program),
        io::ErrorKind::PermissionDenied => Exception::permission(program),
        _ => Exception::internal(format!("failed to run {}: {}", program, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_eot() {
        let values = vec![Value::from(1), Value::from("a")];
        let bytes = encode_input(&values, &CommandSettings::default()).unwrap();
        assert_eq!(bytes, b"1\n\"a\"\n\x04".to_vec());

        let settings = CommandSettings {
            end_of_transmission: false,
            ..CommandSettings::default()
        };
        assert_eq!(encode_input(&[], &settings).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_encode_rejects_exceptions() {
        let values = vec![Value::Exception(Exception::type_error())];
        let err = encode_input(&values, &CommandSettings::default()).unwrap_err();
        assert_eq!(err.name(), "internal");
    }

    #[test]
    fn test_decode_strips_trailing_eot() {
        let values = decode_output(b"[1] 2\x04", &CommandSettings::default()).unwrap();
        assert_eq!(values, vec![Value::array(vec![Value::from(1)]), Value::from(2)]);
    }

    #[test]
    fn test_decode_malformed_output() {
        let err = decode_output(b"{\"a\":", &CommandSettings::default()).unwrap_err();
        assert_eq!(err.name(), "commandOutput");
        let err = decode_output(&[0xff, 0xfe], &CommandSettings::default()).unwrap_err();
        assert_eq!(err.name(), "commandOutput");
    }

    #[test]
    fn test_launch_error_kinds() {
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(launch_error("x", &not_found).name(), "path");
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(launch_error("x", &denied).name(), "permission");
        let other = io::Error::from(io::ErrorKind::Other);
        assert_eq!(launch_error("x", &other).name(), "internal");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemCommandRunner
            .run("jqsh-definitely-not-a-real-program", b"")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
