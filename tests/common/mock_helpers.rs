//! Fake command runners for exercising the `!` operator

use jqsh::CommandRunner;
use std::io;
use std::sync::Mutex;

/// Returns its stdin unchanged and records every call
#[derive(Default)]
pub struct EchoRunner {
    pub calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl CommandRunner for EchoRunner {
    fn run(&self, program: &str, stdin: &[u8]) -> io::Result<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((program.to_string(), stdin.to_vec()));
        }
        Ok(stdin.to_vec())
    }
}

/// Always fails to launch with the given error kind
pub struct FailingRunner(pub io::ErrorKind);

impl CommandRunner for FailingRunner {
    fn run(&self, _program: &str, _stdin: &[u8]) -> io::Result<Vec<u8>> {
        Err(io::Error::from(self.0))
    }
}

/// Always prints the given bytes
pub struct FixedOutputRunner(pub Vec<u8>);

impl CommandRunner for FixedOutputRunner {
    fn run(&self, _program: &str, _stdin: &[u8]) -> io::Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}
