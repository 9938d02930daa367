//! Resolves a parsed program against the filter registry and runs it.
//!
//! Every stage is validated before any stage executes: a validation failure
//! anywhere in the program aborts the run with no output produced and no
//! thread spawned.

use std::io::{Read, Write};

use regex::Regex;

use crate::ast::{Argument, Program, Stage};
use crate::error::Error;
use crate::parser;
use crate::pipeline::{Pipeline, Transform};
use crate::registry::{self, Args, ParamKind, Value};

/// Parses and runs `expression` against `input`, writing the transformed
/// byte stream to `output`.
pub fn execute(
    expression: &str,
    input: impl Read + Send + 'static,
    output: &mut dyn Write,
) -> Result<(), Error> {
    let program = parser::parse(expression)?;
    let transforms = compile(&program)?;

    let mut pipeline = Pipeline::new(input);
    for transform in transforms {
        pipeline.push(transform);
    }
    pipeline.drain(output)?;

    Ok(())
}

/// Validates every stage of the program, in order, and builds its transform
/// chain.
pub fn compile(program: &Program) -> Result<Vec<Transform>, Error> {
    program.stages.iter().map(compile_stage).collect()
}

fn compile_stage(stage: &Stage) -> Result<Transform, Error> {
    let key = stage.name.to_lowercase();

    let Some(spec) = registry::get(&key) else {
        return Err(Error::UnknownFilter {
            name: stage.name.clone(),
            suggestion: suggest(&key),
            position: stage.position,
        });
    };

    if stage.args.len() != spec.params.len() {
        let noun = if spec.params.len() == 1 {
            "argument"
        } else {
            "arguments"
        };
        return Err(Error::Argument {
            message: format!(
                "expected {} {} in call to '{}()', got {}",
                spec.params.len(),
                noun,
                stage.name,
                stage.args.len()
            ),
            name: key,
            position: stage.position,
        });
    }

    let mut values = Vec::with_capacity(spec.params.len());
    for (index, (kind, arg)) in spec.params.iter().zip(&stage.args).enumerate() {
        values.push(coerce(stage, &key, index, *kind, arg)?);
    }

    (spec.build)(Args::new(values)).map_err(|err| Error::Argument {
        message: err.to_string(),
        name: key,
        position: stage.position,
    })
}

/// Checks one argument's tag against its declared kind and coerces it;
/// `Pattern` parameters are compiled here so an invalid regex fails
/// validation, not the running stage.
fn coerce(
    stage: &Stage,
    key: &str,
    index: usize,
    kind: ParamKind,
    arg: &Argument,
) -> Result<Value, Error> {
    let mismatch = |wanted: &str| Error::Argument {
        message: format!(
            "expected argument {} in call to '{}()' to be {}, got {} ({})",
            index + 1,
            stage.name,
            wanted,
            arg,
            arg.kind_name()
        ),
        name: key.to_string(),
        position: stage.position,
    };

    match kind {
        ParamKind::Str => match arg {
            Argument::String(value) => Ok(Value::Str(value.clone())),
            Argument::Int(_) => Err(mismatch("a string")),
        },
        ParamKind::Int => match arg {
            Argument::Int(value) => Ok(Value::Int(*value)),
            Argument::String(_) => Err(mismatch("an int")),
        },
        ParamKind::Pattern => match arg {
            Argument::String(value) => {
                Regex::new(value)
                    .map(Value::Pattern)
                    .map_err(|err| Error::Argument {
                        message: format!(
                            "expected argument {} in call to '{}()' to be a valid regular expression: {}",
                            index + 1,
                            stage.name,
                            err
                        ),
                        name: key.to_string(),
                        position: stage.position,
                    })
            }
            Argument::Int(_) => Err(mismatch("a valid regular expression")),
        },
    }
}

/// Searches every registered name for the closest match by edit distance.
/// A suggestion is kept only when it is strictly closer than no match at
/// all, i.e. its distance is less than the attempted name's length.
fn suggest(name: &str) -> Option<String> {
    let mut lowest = name.len();
    let mut best = None;

    for candidate in registry::ordered_names() {
        let distance = levenshtein(name, candidate);
        if distance < lowest {
            lowest = distance;
            best = Some(candidate);
        }
    }

    best.map(str::to_string)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (prev[j + 1] + 1)
                .min(current[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}
