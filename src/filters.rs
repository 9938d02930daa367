//! The filter catalog: stream-transform factories behind the registry.
//!
//! Every filter is line-oriented: input is split on `\n` (tolerant of
//! `\r\n`), and every emitted line is newline-terminated. Filters that need
//! their whole input before emitting anything (`frequency`, `last`, the
//! counts) buffer internally; everything else streams.

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, Write};

use regex::Regex;

use crate::error::FilterError;
use crate::pipeline::Transform;

/// Keeps the 1-indexed columns listed in `columns` (comma-separated), in the
/// order given, splitting and re-joining each line with `delimiter`.
pub fn columns(delimiter: String, columns: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let order = parse_column_list(&columns)?;

        for line in input.lines() {
            let line = line?;
            let cells: Vec<&str> = line.split(delimiter.as_str()).collect();
            let selected: Vec<&str> = order
                .iter()
                .filter_map(|&index| cells.get(index - 1).copied())
                .collect();
            writeln!(output, "{}", selected.join(delimiter.as_str()))?;
        }

        Ok(())
    })
}

/// CSV-aware variant of [`columns`]: quoted cells containing the delimiter
/// survive the split. The delimiter must be a single character.
pub fn columns_csv(delimiter: String, columns: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let &[delimiter_byte] = delimiter.as_bytes() else {
            return Err(FilterError::Invalid(format!(
                "delimiter must be a single character, got: {delimiter}"
            )));
        };
        let order = parse_column_list(&columns)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_byte)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter_byte)
            .flexible(true)
            .from_writer(output);

        for record in reader.records() {
            let record = record?;
            let selected: Vec<&str> = order
                .iter()
                .filter_map(|&index| record.get(index - 1))
                .collect();
            writer.write_record(&selected)?;
        }

        writer.flush()?;
        Ok(())
    })
}

/// Parses a 1-indexed, comma-separated column list. Indexes below 1 are
/// dropped; a non-integer entry is a stage runtime error.
fn parse_column_list(columns: &str) -> Result<Vec<usize>, FilterError> {
    let mut order = Vec::new();
    for entry in columns.split(',') {
        let index: i64 = entry.trim().parse().map_err(|_| {
            FilterError::Invalid(format!(
                "list of columns must be a comma separated list of ints, got: {columns}"
            ))
        })?;
        if index >= 1 {
            order.push(index as usize);
        }
    }
    Ok(order)
}

/// Emits the number of lines read.
pub fn count_lines() -> Transform {
    Box::new(|input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let mut lines: u64 = 0;
        for line in input.lines() {
            line?;
            lines += 1;
        }
        writeln!(output, "{lines}")?;
        Ok(())
    })
}

/// Emits the number of Unicode scalar values read, line terminators excluded.
pub fn count_runes() -> Transform {
    Box::new(|input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let mut runes: u64 = 0;
        for line in input.lines() {
            runes += line?.chars().count() as u64;
        }
        writeln!(output, "{runes}")?;
        Ok(())
    })
}

/// Emits the number of whitespace-separated words read.
pub fn count_words() -> Transform {
    Box::new(|input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let mut words: u64 = 0;
        for line in input.lines() {
            words += line?.split_whitespace().count() as u64;
        }
        writeln!(output, "{words}")?;
        Ok(())
    })
}

/// Keeps the first `n` lines and stops reading; `n <= 0` keeps nothing.
pub fn first(n: i64) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let mut taken: i64 = 0;
        for line in input.lines() {
            if taken >= n {
                return Ok(());
            }
            writeln!(output, "{}", line?)?;
            taken += 1;
        }
        Ok(())
    })
}

/// Keeps everything after the first `n` lines; `n <= 0` keeps everything.
pub fn not_first(n: i64) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if index as i64 >= n {
                writeln!(output, "{line}")?;
            }
        }
        Ok(())
    })
}

/// Keeps the last `n` lines, retaining at most `n` lines in memory;
/// `n <= 0` keeps nothing.
pub fn last(n: i64) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        if n <= 0 {
            return Ok(());
        }
        let keep = n as usize;
        let mut window: VecDeque<String> = VecDeque::new();
        for line in input.lines() {
            if window.len() == keep {
                window.pop_front();
            }
            window.push_back(line?);
        }
        for line in window {
            writeln!(output, "{line}")?;
        }
        Ok(())
    })
}

/// Keeps everything up to the last `n` lines; `n <= 0` keeps nothing.
pub fn not_last(n: i64) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        if n <= 0 {
            return Ok(());
        }
        let hold = n as usize;
        let mut window: VecDeque<String> = VecDeque::new();
        for line in input.lines() {
            window.push_back(line?);
            if window.len() > hold
                && let Some(line) = window.pop_front()
            {
                writeln!(output, "{line}")?;
            }
        }
        Ok(())
    })
}

/// Emits unique lines prefixed with right-aligned occurrence counts, most
/// frequent first; lines with equal counts sort alphabetically.
pub fn frequency() -> Transform {
    Box::new(|input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for line in input.lines() {
            *counts.entry(line?).or_insert(0) += 1;
        }

        let max = counts.values().copied().max().unwrap_or(0);
        let width = max.to_string().len();

        let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (line, count) in entries {
            writeln!(output, "{count:>width$} {line}")?;
        }
        Ok(())
    })
}

/// Joins all lines into one, separated by `delimiter`.
pub fn join(delimiter: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        let mut lines = input.lines();
        if let Some(line) = lines.next() {
            write!(output, "{}", line?)?;
            for line in lines {
                write!(output, "{}{}", delimiter, line?)?;
            }
        }
        writeln!(output)?;
        Ok(())
    })
}

/// Keeps lines containing `substring`; an empty substring keeps nothing.
pub fn contains(substring: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        if substring.is_empty() {
            return Ok(());
        }
        for line in input.lines() {
            let line = line?;
            if line.contains(substring.as_str()) {
                writeln!(output, "{line}")?;
            }
        }
        Ok(())
    })
}

/// Keeps lines not containing `substring`; an empty substring keeps nothing.
pub fn not_contains(substring: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        if substring.is_empty() {
            return Ok(());
        }
        for line in input.lines() {
            let line = line?;
            if !line.contains(substring.as_str()) {
                writeln!(output, "{line}")?;
            }
        }
        Ok(())
    })
}

/// Keeps lines matching `regex`; an empty pattern keeps nothing.
pub fn match_regex(regex: Regex) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        if regex.as_str().is_empty() {
            return Ok(());
        }
        for line in input.lines() {
            let line = line?;
            if regex.is_match(&line) {
                writeln!(output, "{line}")?;
            }
        }
        Ok(())
    })
}

/// Keeps lines not matching `regex`; an empty pattern keeps nothing.
pub fn not_match_regex(regex: Regex) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        if regex.as_str().is_empty() {
            return Ok(());
        }
        for line in input.lines() {
            let line = line?;
            if !regex.is_match(&line) {
                writeln!(output, "{line}")?;
            }
        }
        Ok(())
    })
}

/// Replaces all non-overlapping instances of `old` with `new` in each line.
pub fn replace(old: String, new: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        for line in input.lines() {
            writeln!(output, "{}", line?.replace(old.as_str(), new.as_str()))?;
        }
        Ok(())
    })
}

/// Replaces all matches of `regex` with `replacement` in each line; `$n`
/// in the replacement refers to the n-th capture group.
pub fn replace_regex(regex: Regex, replacement: String) -> Transform {
    Box::new(move |input: Box<dyn BufRead + Send>, output: &mut dyn Write| {
        for line in input.lines() {
            let line = line?;
            writeln!(output, "{}", regex.replace_all(&line, replacement.as_str()))?;
        }
        Ok(())
    })
}
