//! Error handling and exit codes.

use fibntt_core::calculator::FibError;
use fibntt_core::constants::exit_codes;

/// Map a calculation error to its exit code.
pub fn handle_error(err: &FibError) -> i32 {
    match err {
        FibError::Calculation(_) | FibError::Overflow(_, _) | FibError::InvalidInput(_) => {
            exit_codes::ERROR_GENERIC
        }
        FibError::Config(_) => exit_codes::ERROR_CONFIG,
        FibError::Cancelled => exit_codes::ERROR_CANCELED,
        FibError::Timeout(_) => exit_codes::ERROR_TIMEOUT,
        FibError::Mismatch => exit_codes::ERROR_MISMATCH,
    }
}

/// Exit code for an application error: the mapped code when it carries a
/// `FibError`, the generic code otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FibError>()
        .map_or(exit_codes::ERROR_GENERIC, handle_error)
}
