//! Process exit codes
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Command completed |
//! | 1 | Any error (load, validation, analysis, rendering, IO) |

use std::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl<T, E> From<&Result<T, E>> for ExitCode {
    fn from(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}
