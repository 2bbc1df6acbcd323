//! Protocol Module
//!
//! Defines the line-framed command protocol spoken over the agent socket.
//! One connection carries exactly one command and one response.
//!
//! ## Command Format
//! ```text
//! ┌───────┬─────────┬───────┬─────────┬───┬─────────┬───────┬─────────────┬────┐
//! │ delim │ command │ delim │ param 1 │ = │ value 1 │ delim │ data length │ \n │
//! └───────┴─────────┴───────┴─────────┴───┴─────────┴───────┴─────────────┴────┘
//! ┌────────────┐
//! │ data bytes │
//! └────────────┘
//! ```
//! The delimiter is the first of ` ^!$%@#*~` absent from every parameter
//! value. The leading delimiter is omitted when it is a space.
//!
//! ## Response Format
//! ```text
//! ┌────────┬────┐        ┌────────┬─────────────┬─────────────┬────┐
//! │ status │ \n │   or   │ status │ white space │ data length │ \n │
//! └────────┴────┘        └────────┴─────────────┴─────────────┴────┘
//! ┌────────────┐
//! │ data bytes │
//! └────────────┘
//! ```
//! A status beginning with `SUCCESS` marks success.

mod command;
mod response;
mod codec;
mod interpreter;
pub mod delimiter;

pub use command::{Command, Params, REQUEST_ID_PARAM};
pub use response::{Response, ResponseData, ERROR, SUCCESS};
pub use codec::{encode_command, write_command, read_response, parse_response_header, READ_CHUNK_SIZE};
pub use interpreter::{
    encode_response, read_command, write_response, DEFAULT_PARAM_VALUE, MAX_DATA_LENGTH,
};
pub use delimiter::{select_delimiter, DEFAULT_DELIMITER, DELIMITERS};
