//! Line and word level scanning of snippet text using `nom`.
//!
//! [`logical_lines`] folds backslash continuations into one logical line
//! while keeping the exact source text. The word parsers below split an
//! instruction into its keyword and arguments.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{eof, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, preceded, terminated},
};

/// One logical snippet line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    /// Comment or blank line.
    Trivia {
        /// 1-based line number.
        line: usize,
        /// Text without the line terminator.
        text: String,
    },
    /// Instruction text, possibly folded from several physical lines.
    Instruction {
        /// 1-based number of the first physical line.
        line: usize,
        /// Exact source of the physical lines, including their line endings,
        /// without the terminator of the last one.
        original: String,
        /// Continuations removed and joined by a single space.
        joined: String,
    },
}

fn is_comment(text: &str) -> bool {
    text.trim_start().starts_with('#')
}

/// Splits snippet text into logical lines.
///
/// Comment and blank lines inside a continuation belong to the instruction's
/// original text but not to its joined form. An unterminated continuation at
/// end of input closes the instruction. `\r\n` endings are accepted; inside a
/// continued instruction they are kept as written.
#[must_use]
pub fn logical_lines(input: &str) -> Vec<RawLine> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, Vec<&str>, Vec<&str>)> = None;

    for (idx, raw) in input.split_inclusive('\n').enumerate() {
        let number = idx + 1;
        let physical = strip_terminator(raw);
        match pending.as_mut() {
            None => {
                if physical.trim().is_empty() || is_comment(physical) {
                    lines.push(RawLine::Trivia {
                        line: number,
                        text: physical.to_string(),
                    });
                    continue;
                }
                pending = Some((number, vec![raw], Vec::new()));
            }
            Some((_, original, _)) => {
                original.push(raw);
                if physical.trim().is_empty() || is_comment(physical) {
                    continue;
                }
            }
        }

        let Some((start, original, segments)) = pending.as_mut() else {
            continue;
        };
        let body = physical.trim_end();
        if let Some(head) = body.strip_suffix('\\') {
            segments.push(head.trim());
        } else {
            segments.push(body.trim());
            lines.push(RawLine::Instruction {
                line: *start,
                original: strip_terminator(&original.concat()).to_string(),
                joined: join_segments(segments),
            });
            pending = None;
        }
    }

    if let Some((start, original, segments)) = pending {
        lines.push(RawLine::Instruction {
            line: start,
            original: strip_terminator(&original.concat()).to_string(),
            joined: join_segments(&segments),
        });
    }
    lines
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}

fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the leading instruction keyword.
///
/// The keyword must be followed by whitespace or end of input, so
/// `COPY--from` is not a keyword.
pub fn keyword(input: &str) -> IResult<&str, &str> {
    terminated(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        peek(alt((multispace1, eof))),
    )
    .parse(input)
}

/// Parses one shell-form word: a run of non-whitespace characters.
fn shell_word(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_till1(char::is_whitespace)).parse(input)
}

/// Splits shell-form arguments on whitespace.
#[must_use]
pub fn shell_words(input: &str) -> Vec<&str> {
    many0(shell_word)
        .parse(input)
        .map(|(_, words)| words)
        .unwrap_or_default()
}

/// Parses a leading `--flag` or `--flag=value` word.
pub fn flag(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, recognize((tag("--"), take_till1(char::is_whitespace)))).parse(input)
}

/// Parses a double-quoted JSON string with the common escapes.
fn json_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.char_indices();
    loop {
        match chars.next() {
            Some((idx, '"')) => return Ok((&input[idx + 1..], result)),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, '\\')) => result.push('\\'),
                Some((_, '"')) => result.push('"'),
                Some((_, '/')) => result.push('/'),
                _ => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        input,
                        nom::error::ErrorKind::Escaped,
                    )));
                }
            },
            Some((_, c)) => result.push(c),
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parses a complete JSON array of strings, e.g. `["a", "b"]`.
///
/// Trailing input other than whitespace is an error.
pub fn json_array(input: &str) -> IResult<&str, Vec<String>> {
    let separator = (multispace0, char(','), multispace0);
    terminated(
        delimited(
            (multispace0, char('['), multispace0),
            separated_list0(separator, json_string),
            (multispace0, char(']')),
        ),
        (multispace0, eof),
    )
    .parse(input)
}
