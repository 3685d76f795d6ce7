//! Exit code constants for the studyforge CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration or documents |
//! | 8 | `CONTENT_BLOCKED` | Provider safety policy refused the request |
//! | 70 | `BACKEND_FAILURE` | Backend failure surfaced directly |

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    pub const INTERNAL: ExitCode = ExitCode(1);

    pub const CLI_ARGS: ExitCode = ExitCode(2);

    pub const CONTENT_BLOCKED: ExitCode = ExitCode(8);

    pub const BACKEND_FAILURE: ExitCode = ExitCode(70);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
