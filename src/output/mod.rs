//! Command output model and text decoding.
//!
//! # Example
//!
//! ```
//! use command_exec::output::{CommandOutput, TextEncoding};
//!
//! let mut output = CommandOutput::new();
//! output.set_stdout(b"first\r\nsecond\n".to_vec());
//! output.set_return_code(0);
//!
//! assert!(output.is_exit_success());
//! assert_eq!(output.stdout_as_lines().unwrap(), vec!["first", "second"]);
//! assert_eq!(TextEncoding::Utf8.decode(b"plain"), "plain");
//! ```

mod command_output;
mod encoding;

pub use command_output::{CommandOutput, TIMEOUT_EXIT_CODE};
pub use encoding::{decode_utf16le, normalize_newlines, split_lines, TextEncoding};
