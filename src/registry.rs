//! The filter registry: an immutable table mapping case-folded filter name
//! to declared parameter kinds, a human-readable signature, and a transform
//! factory.
//!
//! Negated filters (`!first`, `!match`, ...) are independent entries with
//! their own factories, not runtime-negated wrappers; filters with no
//! sensible negation (`frequency`, the counts) are simply absent from the
//! negated set. The table is constructed once at first use and never
//! mutated.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FilterError;
use crate::filters;
use crate::pipeline::Transform;

/// Declared kind of one formal parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Any string literal.
    Str,
    /// Any integer literal.
    Int,
    /// A string literal that must compile as a regular expression.
    Pattern,
}

/// A coerced call argument, ready for a filter factory.
#[derive(Debug)]
pub enum Value {
    Str(String),
    Int(i64),
    Pattern(Regex),
}

/// Consuming cursor over coerced arguments.
///
/// Factories destructure exactly their declared parameters through the
/// typed accessors; a mismatch is reported as a validation failure rather
/// than a panic.
pub struct Args(std::vec::IntoIter<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values.into_iter())
    }

    fn next_value(&mut self, wanted: &str) -> Result<Value, FilterError> {
        self.0
            .next()
            .ok_or_else(|| FilterError::Invalid(format!("missing {wanted} argument")))
    }

    pub fn take_str(&mut self) -> Result<String, FilterError> {
        match self.next_value("string")? {
            Value::Str(value) => Ok(value),
            other => Err(mismatch("string", &other)),
        }
    }

    pub fn take_int(&mut self) -> Result<i64, FilterError> {
        match self.next_value("int")? {
            Value::Int(value) => Ok(value),
            other => Err(mismatch("int", &other)),
        }
    }

    pub fn take_pattern(&mut self) -> Result<Regex, FilterError> {
        match self.next_value("pattern")? {
            Value::Pattern(value) => Ok(value),
            other => Err(mismatch("pattern", &other)),
        }
    }
}

fn mismatch(wanted: &str, got: &Value) -> FilterError {
    let got = match got {
        Value::Str(_) => "string",
        Value::Int(_) => "int",
        Value::Pattern(_) => "pattern",
    };
    FilterError::Invalid(format!("expected {wanted} argument, got {got}"))
}

/// One registry entry.
pub struct FilterSpec {
    /// Declared parameter kinds, in call order.
    pub params: &'static [ParamKind],
    /// Call signature shown in help and hints.
    pub definition: &'static str,
    /// One-paragraph description for the help listing.
    pub description: &'static str,
    /// Builds the stream transform from already-validated arguments.
    pub build: fn(Args) -> Result<Transform, FilterError>,
}

/// Looks up a filter by its case-folded name.
pub fn get(name: &str) -> Option<&'static FilterSpec> {
    FILTERS.get(name)
}

/// All registered names, sorted with each negated variant immediately after
/// its base filter. Used for the suggestion search and the help listing.
pub fn ordered_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FILTERS.keys().copied().collect();
    names.sort_by(|a, b| {
        let (a_base, a_negated) = split_negation(a);
        let (b_base, b_negated) = split_negation(b);
        a_base.cmp(b_base).then(a_negated.cmp(&b_negated))
    });
    names
}

fn split_negation(name: &str) -> (&str, bool) {
    match name.strip_prefix('!') {
        Some(base) => (base, true),
        None => (name, false),
    }
}

static FILTERS: Lazy<HashMap<&'static str, FilterSpec>> = Lazy::new(|| {
    HashMap::from([
        (
            "columns",
            FilterSpec {
                params: &[ParamKind::Str, ParamKind::Str],
                definition: "Columns(delimiter string, columns string)",
                description: "Returns the selected `columns` in order, where `columns` is a 1-indexed comma separated list of column positions. Columns are defined by splitting with the `delimiter`.",
                build: |mut args| Ok(filters::columns(args.take_str()?, args.take_str()?)),
            },
        ),
        (
            "columnscsv",
            FilterSpec {
                params: &[ParamKind::Str, ParamKind::Str],
                definition: "ColumnsCSV(delimiter string, columns string)",
                description: "Returns the selected `columns` in order, where `columns` is a 1-indexed comma separated list of column positions. Parsing is CSV aware, so quoted columns containing the `delimiter` survive the split.",
                build: |mut args| Ok(filters::columns_csv(args.take_str()?, args.take_str()?)),
            },
        ),
        (
            "countlines",
            FilterSpec {
                params: &[],
                definition: "CountLines()",
                description: "Returns the line count.",
                build: |_args| Ok(filters::count_lines()),
            },
        ),
        (
            "countrunes",
            FilterSpec {
                params: &[],
                definition: "CountRunes()",
                description: "Returns the rune (Unicode code point) count, line terminators excluded.",
                build: |_args| Ok(filters::count_runes()),
            },
        ),
        (
            "countwords",
            FilterSpec {
                params: &[],
                definition: "CountWords()",
                description: "Returns the word count. Words are maximal runs of non-whitespace characters.",
                build: |_args| Ok(filters::count_words()),
            },
        ),
        (
            "first",
            FilterSpec {
                params: &[ParamKind::Int],
                definition: "First(n int)",
                description: "Returns the first `n` lines. If the input has fewer than `n` lines, all lines are returned.",
                build: |mut args| Ok(filters::first(args.take_int()?)),
            },
        ),
        (
            "!first",
            FilterSpec {
                params: &[ParamKind::Int],
                definition: "!First(n int)",
                description: "Returns all but the first `n` lines. If the input has fewer than `n` lines, no lines are returned.",
                build: |mut args| Ok(filters::not_first(args.take_int()?)),
            },
        ),
        (
            "frequency",
            FilterSpec {
                params: &[],
                definition: "Frequency()",
                description: "Returns a descending list of frequency and unique line. Lines with equal frequency are sorted alphabetically.",
                build: |_args| Ok(filters::frequency()),
            },
        ),
        (
            "join",
            FilterSpec {
                params: &[ParamKind::Str],
                definition: "Join(delimiter string)",
                description: "Joins all lines together separated by `delimiter`.",
                build: |mut args| Ok(filters::join(args.take_str()?)),
            },
        ),
        (
            "last",
            FilterSpec {
                params: &[ParamKind::Int],
                definition: "Last(n int)",
                description: "Returns the last `n` lines. If the input has fewer than `n` lines, all lines are returned.",
                build: |mut args| Ok(filters::last(args.take_int()?)),
            },
        ),
        (
            "!last",
            FilterSpec {
                params: &[ParamKind::Int],
                definition: "!Last(n int)",
                description: "Returns all but the last `n` lines. If the input has fewer than `n` lines, no lines are returned.",
                build: |mut args| Ok(filters::not_last(args.take_int()?)),
            },
        ),
        (
            "match",
            FilterSpec {
                params: &[ParamKind::Str],
                definition: "Match(substring string)",
                description: "Returns all lines that contain `substring`.",
                build: |mut args| Ok(filters::contains(args.take_str()?)),
            },
        ),
        (
            "!match",
            FilterSpec {
                params: &[ParamKind::Str],
                definition: "!Match(substring string)",
                description: "Returns all lines that don't contain `substring`.",
                build: |mut args| Ok(filters::not_contains(args.take_str()?)),
            },
        ),
        (
            "matchregex",
            FilterSpec {
                params: &[ParamKind::Pattern],
                definition: "MatchRegex(regex string)",
                description: "Returns all lines that match the compiled regular expression `regex`.",
                build: |mut args| Ok(filters::match_regex(args.take_pattern()?)),
            },
        ),
        (
            "!matchregex",
            FilterSpec {
                params: &[ParamKind::Pattern],
                definition: "!MatchRegex(regex string)",
                description: "Returns all lines that don't match the compiled regular expression `regex`.",
                build: |mut args| Ok(filters::not_match_regex(args.take_pattern()?)),
            },
        ),
        (
            "replace",
            FilterSpec {
                params: &[ParamKind::Str, ParamKind::Str],
                definition: "Replace(old string, replace string)",
                description: "Replaces all non-overlapping instances of `old` with `replace`.",
                build: |mut args| Ok(filters::replace(args.take_str()?, args.take_str()?)),
            },
        ),
        (
            "replaceregex",
            FilterSpec {
                params: &[ParamKind::Pattern, ParamKind::Str],
                definition: "ReplaceRegex(regex string, replace string)",
                description: "Replaces all matches of the compiled regular expression `regex` with `replace`. Inside `replace`, `$` signs represent submatches: `$1` is the text of the first submatch.",
                build: |mut args| {
                    Ok(filters::replace_regex(args.take_pattern()?, args.take_str()?))
                },
            },
        ),
    ])
});
