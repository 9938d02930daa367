//! Command-line surface: argument handling, the help listing, and
//! diagnostic rendering.
//!
//! Diagnostics mark the offending span of the original expression with red
//! undercurl and append the most useful hint available: the suggested
//! filter's call signature for a near-miss name, or the failing filter's
//! own signature for an argument problem.

use std::io;

use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};

use crate::error::Error;
use crate::executor;
use crate::registry;
use crate::token::Position;

const SEE_HELP: &str = "See 'textsieve --help'.";

const RED: &str = "\x1b[31m";
const UNDERCURL: &str = "\x1b[4:3m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Parser)]
#[command(
    name = "textsieve",
    about = "Command-line text processor",
    disable_version_flag = true
)]
struct Cli {
    /// Pipeline of filters to run against stdin, as a single argument
    expression: String,
}

/// Runs the tool against stdin/stdout and returns the process exit code.
pub fn run() -> i32 {
    let command = Cli::command()
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            clap::Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version"),
        )
        .after_help(filter_help());

    let matches = match command.try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
        }
    };

    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return 1;
        }
    };

    if cli.expression.is_empty() {
        eprintln!("error: no pipeline defined.\n{SEE_HELP}");
        return 1;
    }

    let mut stdout = io::stdout();
    match executor::execute(&cli.expression, io::stdin(), &mut stdout) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", render_error(&err, &cli.expression));
            1
        }
    }
}

/// Formats an error for stderr: context-prefixed message, the marked-up
/// expression for position-bearing errors, and a corrective hint.
fn render_error(err: &Error, expression: &str) -> String {
    let message = match err {
        Error::Lexical { .. } | Error::Syntax { .. } => format!("error parsing pipeline: {err}"),
        Error::UnknownFilter { .. } | Error::Argument { .. } => {
            format!("error running pipeline: {err}")
        }
        Error::Runtime(_) => err.to_string(),
    };

    let hint = match err {
        Error::UnknownFilter {
            suggestion: Some(suggestion),
            ..
        } => match registry::get(suggestion) {
            Some(spec) => format!("Did you mean '{}'?\n{SEE_HELP}", spec.definition),
            None => SEE_HELP.to_string(),
        },
        Error::Argument { name, .. } => match registry::get(name) {
            Some(spec) => format!("{}. {SEE_HELP}", spec.definition),
            None => SEE_HELP.to_string(),
        },
        _ => SEE_HELP.to_string(),
    };

    match err.position() {
        Some(position) => format!(
            "error: {message}:\n\t{}\n{hint}",
            mark_span(expression, position)
        ),
        None => format!("error: {message}.\n{hint}"),
    }
}

/// Wraps the span in ANSI red undercurl. A span at end-of-text underlines a
/// padding space appended for the purpose.
fn mark_span(expression: &str, position: Position) -> String {
    let mut text = expression.to_string();
    if position.start >= text.len() {
        text.push(' ');
    }

    let start = position.start.min(text.len());
    let end = position.end.clamp(start, text.len());

    match (text.get(..start), text.get(start..end), text.get(end..)) {
        (Some(before), Some(marked), Some(after)) => {
            format!("{before}{RED}{UNDERCURL}{marked}{RESET}{after}")
        }
        // Span does not fall on character boundaries; show the text unmarked.
        _ => text,
    }
}

/// Renders the filter catalog section appended to `--help`.
fn filter_help() -> String {
    let mut help = String::new();
    let mut w = |line: &str| wrap_into(&mut help, line);

    w("Example:");
    w("  $ echo \"cat cat cat dog bird bird bird bird\" | \\");
    w("  textsieve 'Replace(\" \", \"\\n\") | Frequency() | First(1)'");
    w("  4 bird");
    w("");
    w("Filters:");
    w("  All filters can be '|' (piped) together in any order, although not all ordering is logical.");
    w("");
    w("  All filter arguments are required. There are no assumptions about default values.");
    w("");
    w("  A filter prefixed with \"!\" returns the opposite result of the unprefixed filter of the same name. `First(1)` keeps only the first line of the input; `!First(1)` (read as not first) skips the first line and keeps everything else.");
    w("");
    w("  ---");
    w("");
    for name in registry::ordered_names() {
        if let Some(spec) = registry::get(name) {
            w(&format!("  {}", spec.definition));
            w(&format!("    {}", spec.description));
            w("");
        }
    }

    help
}

/// Word-wraps one logical line to 80 columns, repeating its leading-space
/// indent on continuation lines.
fn wrap_into(out: &mut String, line: &str) {
    const WIDTH: usize = 80;

    let indent_len = line.len() - line.trim_start_matches(' ').len();
    let (indent, body) = line.split_at(indent_len);
    if body.is_empty() {
        out.push('\n');
        return;
    }

    let width = WIDTH.saturating_sub(indent.len()).max(1);
    let mut current = String::new();

    for word in body.split(' ') {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            out.push_str(indent);
            out.push_str(&current);
            out.push('\n');
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    out.push_str(indent);
    out.push_str(&current);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    #[test]
    fn test_mark_span_mid_expression() {
        let got = mark_span("Foo() | First(1)", Position::new(0, 3));
        assert!(got.starts_with(RED));
        assert!(got.contains("Foo"));
        assert!(got.ends_with(" | First(1)"));
    }

    #[test]
    fn test_mark_span_at_end_of_text() {
        let got = mark_span("Match(\"pl\"", Position::new(10, 11));
        // A padding space is appended so the span has something to underline.
        assert!(got.contains(&format!("{RED}{UNDERCURL} {RESET}")));
    }

    #[test]
    fn test_render_unknown_filter_includes_suggestion_definition() {
        let err = Error::UnknownFilter {
            name: "Frequncy".to_string(),
            suggestion: Some("frequency".to_string()),
            position: Position::new(0, 8),
        };
        let got = render_error(&err, "Frequncy()");
        assert!(got.contains("unknown filter 'Frequncy()'"));
        assert!(got.contains("Did you mean 'Frequency()'?"));
        assert!(got.contains(SEE_HELP));
    }

    #[test]
    fn test_render_argument_error_includes_definition() {
        let err = Error::Argument {
            message: "expected 1 argument in call to 'First()', got 0".to_string(),
            name: "first".to_string(),
            position: Position::new(0, 5),
        };
        let got = render_error(&err, "First()");
        assert!(got.contains("First(n int)"));
    }

    #[test]
    fn test_render_syntax_error_marks_expression() {
        let err = Error::Syntax {
            found: Token::new(TokenKind::Eof, String::new(), Position::new(10, 11)),
            expected: vec![TokenKind::RParen, TokenKind::Comma],
        };
        let got = render_error(&err, "Match(\"pl\"");
        assert!(got.contains("error parsing pipeline"));
        assert!(got.contains(RED));
    }

    #[test]
    fn test_filter_help_lists_every_filter() {
        let help = filter_help();
        for name in registry::ordered_names() {
            let definition = registry::get(name).unwrap().definition;
            let head: String = definition.chars().take(20).collect();
            assert!(help.contains(&head), "missing {definition}");
        }
    }

    #[test]
    fn test_wrap_preserves_indent() {
        let mut out = String::new();
        let long = format!("  {}", "word ".repeat(30));
        wrap_into(&mut out, long.trim_end());
        for line in out.lines() {
            assert!(line.starts_with("  "));
            assert!(line.len() <= 80);
        }
        assert_eq!(out.matches("word").count(), 30);
    }
}
