//! # textsieve
//!
//! A command-line text processor: a small pipeline expression names the
//! filters to apply, and the input byte stream flows through them left to
//! right.
//!
//! ## Overview
//!
//! An expression is a flat, `|`-separated sequence of filter calls:
//!
//! ```text
//! Replace(" ", "\n") | Frequency() | First(1)
//! ```
//!
//! The front end lexes and parses the expression into a position-tracked
//! AST. The executor resolves each call against an immutable filter
//! registry, validates argument counts and types against the declared
//! parameter kinds, and builds a chain of stream transforms. The pipeline
//! engine runs every stage concurrently, connected by bounded in-memory
//! byte conduits, and drains the last stage to the output sink.
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use textsieve::execute;
//!
//! let input = Cursor::new("cat cat cat dog bird bird bird bird".to_string());
//! let mut output = Vec::new();
//!
//! execute(
//!     r#"Replace(" ", "\n") | Frequency() | First(1)"#,
//!     input,
//!     &mut output,
//! )
//! .unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "4 bird\n");
//! ```

pub mod ast;
pub mod cli;
pub mod error;
pub mod executor;
pub mod filters;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod token;

pub use ast::{Argument, Program, Stage};
pub use error::{Error, FilterError};
pub use executor::{compile, execute};
pub use lexer::Lexer;
pub use parser::{Parser, parse};
pub use pipeline::{Pipeline, Transform};
pub use registry::{FilterSpec, ParamKind};
pub use token::{Position, Token, TokenKind};
