//! End-to-end tests driving the real binary against real stdin/stdout.

use std::io::Write as _;

use assert_cmd::Command;
use predicates::prelude::*;

fn textsieve() -> Command {
    Command::cargo_bin("textsieve").unwrap()
}

#[test]
fn test_frequency_pipeline() {
    textsieve()
        .arg(r#"Replace(" ", "\n") | Frequency() | First(1)"#)
        .write_stdin("cat cat cat dog bird bird bird bird")
        .assert()
        .success()
        .stdout("4 bird\n");
}

#[test]
fn test_count_lines_empty_input() {
    textsieve()
        .arg("CountLines()")
        .write_stdin("")
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_first_negative_is_valid_and_empty() {
    textsieve()
        .arg("First(-1)")
        .write_stdin("a\nb\nc\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_case_insensitive_names() {
    textsieve()
        .arg("countwords()")
        .write_stdin("one two three")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_negated_filter() {
    textsieve()
        .arg(r#"!Match("dog")"#)
        .write_stdin("cat\ndog\nbird\n")
        .assert()
        .success()
        .stdout("cat\nbird\n");
}

#[test]
fn test_unknown_filter_fails() {
    textsieve()
        .arg("Foo()")
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown filter 'Foo()'"));
}

#[test]
fn test_unknown_filter_suggests_nearest_name() {
    textsieve()
        .arg("Frequncy()")
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'Frequency()'?"));
}

#[test]
fn test_syntax_error_missing_paren() {
    textsieve()
        .arg(r#"Match("pl""#)
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error parsing pipeline"))
        .stderr(predicate::str::contains("')'"));
}

#[test]
fn test_invalid_pattern_names_argument() {
    textsieve()
        .arg(r#"MatchRegex("[")"#)
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("argument 1"))
        .stderr(predicate::str::contains("MatchRegex(regex string)"));
}

#[test]
fn test_argument_error_shows_definition() {
    textsieve()
        .arg("First()")
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "expected 1 argument in call to 'First()', got 0",
        ))
        .stderr(predicate::str::contains("First(n int)"));
}

#[test]
fn test_empty_expression_is_an_argument_error() {
    textsieve()
        .arg("")
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no pipeline defined"));
}

#[test]
fn test_missing_expression_is_an_argument_error() {
    textsieve().assert().failure().code(1);
}

#[test]
fn test_help_lists_filter_catalog() {
    textsieve()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Frequency()"))
        .stdout(predicate::str::contains("!First(n int)"))
        .stdout(predicate::str::contains("ReplaceRegex(regex string"));
}

#[test]
fn test_version_flags() {
    for flag in ["-v", "--version"] {
        textsieve()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_stage_runtime_error_exits_nonzero() {
    // The column list is validated by the running stage, not up front.
    textsieve()
        .arg(r#"Columns(",", "not-a-number")"#)
        .write_stdin("a,b\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error filtering pipeline"));
}

#[test]
fn test_pipeline_from_file_input() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    for department in ["sales", "sales", "engineering", "sales", "support"] {
        writeln!(input, "{department},1").unwrap();
    }

    // "engineering" is the only department without an 's'.
    textsieve()
        .arg(r#"Columns(",", "1") | Match("s") | CountLines()"#)
        .pipe_stdin(input.path())
        .unwrap()
        .assert()
        .success()
        .stdout("4\n");
}
