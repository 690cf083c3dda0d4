//! Dockerfile snippet parser built on `nom`.
//!
//! Turns a feature's raw build snippet into a [`Snippet`] through line
//! folding, keyword recognition and, for COPY, argument decoding. Parsing is
//! lossless: every item keeps the text it was read from.

pub mod ast;
pub mod lexer;
pub mod validator;

use featurize_common::error::FeaturizeError;
use thiserror::Error;

use self::ast::{ArgForm, CopyArgs, Instruction, Item, Keyword, Snippet, Trivia};
use self::lexer::RawLine;

/// Errors produced while parsing a single snippet.
///
/// Line numbers are 1-based within the snippet. The feature name is attached
/// when converting into [`FeaturizeError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnippetError {
    /// The line does not start with a known instruction, or its arguments
    /// cannot be decoded.
    #[error("line {line}: {message}")]
    Unparseable {
        /// Line of the offending instruction.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// A COPY instruction names fewer than two paths.
    #[error("line {line}: COPY requires at least a source and a destination: {instruction}")]
    MalformedCopy {
        /// Line of the offending instruction.
        line: usize,
        /// Instruction text as written.
        instruction: String,
    },
}

impl SnippetError {
    /// Attaches the owning feature and converts into the workspace error.
    #[must_use]
    pub fn into_featurize(self, feature: &str) -> FeaturizeError {
        match self {
            Self::Unparseable { line, message } => FeaturizeError::SnippetParse {
                feature: feature.to_string(),
                line,
                message,
            },
            Self::MalformedCopy { line, instruction } => {
                FeaturizeError::MalformedCopyInstruction {
                    feature: feature.to_string(),
                    line,
                    instruction,
                }
            }
        }
    }
}

/// Parses a build snippet.
///
/// # Errors
///
/// Returns [`SnippetError::Unparseable`] for a line that does not start with
/// a known instruction keyword, and the COPY errors of [`parse_copy`] for
/// every COPY instruction in the snippet.
pub fn parse_snippet(input: &str) -> Result<Snippet, SnippetError> {
    let mut snippet = Snippet::default();
    for raw in lexer::logical_lines(input) {
        let item = match raw {
            RawLine::Trivia { line, text } => Item::Trivia(Trivia { line, text }),
            RawLine::Instruction {
                line,
                original,
                joined,
            } => Item::Instruction(parse_instruction(line, original, &joined)?),
        };
        snippet.items.push(item);
    }
    Ok(snippet)
}

fn parse_instruction(
    line: usize,
    original: String,
    joined: &str,
) -> Result<Instruction, SnippetError> {
    let (rest, word) = lexer::keyword(joined).map_err(|_| SnippetError::Unparseable {
        line,
        message: format!("expected an instruction keyword, got \"{}\"", preview(joined)),
    })?;
    let keyword = Keyword::from_word(word).ok_or_else(|| SnippetError::Unparseable {
        line,
        message: format!("unknown instruction {word}"),
    })?;
    let instruction = Instruction {
        line,
        keyword,
        original,
        arguments: rest.trim().to_string(),
    };
    if keyword == Keyword::Copy {
        let _ = parse_copy(&instruction)?;
    }
    Ok(instruction)
}

fn preview(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(20)
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

/// Decodes the arguments of a COPY instruction.
///
/// Leading `--flag` words are kept verbatim. The remaining arguments are
/// either a JSON array or whitespace-separated words; the last one is the
/// destination.
///
/// # Errors
///
/// Returns [`SnippetError::Unparseable`] for a malformed JSON array and
/// [`SnippetError::MalformedCopy`] when fewer than two paths remain.
pub fn parse_copy(instruction: &Instruction) -> Result<CopyArgs, SnippetError> {
    let line = instruction.line;
    let mut rest = instruction.arguments.as_str();
    let mut flags = Vec::new();
    while let Ok((after, flag)) = lexer::flag(rest) {
        flags.push(flag.to_string());
        rest = after;
    }
    let rest = rest.trim();

    let (mut paths, form) = if rest.starts_with('[') {
        let (_, items) = lexer::json_array(rest).map_err(|_| SnippetError::Unparseable {
            line,
            message: format!("invalid JSON array in COPY arguments: {rest}"),
        })?;
        (items, ArgForm::Json)
    } else {
        let words = lexer::shell_words(rest)
            .into_iter()
            .map(str::to_string)
            .collect();
        (words, ArgForm::Shell)
    };

    if paths.len() < 2 {
        return Err(SnippetError::MalformedCopy {
            line,
            instruction: instruction.original.clone(),
        });
    }
    let destination = paths.pop().unwrap_or_default();
    Ok(CopyArgs {
        flags,
        sources: paths,
        destination,
        form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_instruction(src: &str) -> Instruction {
        let snippet = parse_snippet(src).expect("should parse");
        snippet.instructions().next().cloned().expect("one instruction")
    }

    #[test]
    fn parse_empty_snippet() {
        let snippet = parse_snippet("").expect("should parse empty input");
        assert!(snippet.items.is_empty());
    }

    #[test]
    fn parse_keeps_trivia_and_instructions_in_order() {
        let snippet = parse_snippet("# python\nRUN apt-get install -y python3\n\nENV PYTHONUNBUFFERED=1\n")
            .expect("should parse");
        assert_eq!(snippet.items.len(), 4);
        assert!(matches!(&snippet.items[0], Item::Trivia(t) if t.text == "# python"));
        assert!(matches!(&snippet.items[2], Item::Trivia(t) if t.is_blank()));
        let keywords: Vec<Keyword> = snippet.instructions().map(|i| i.keyword).collect();
        assert_eq!(keywords, vec![Keyword::Run, Keyword::Env]);
    }

    #[test]
    fn instruction_records_line_and_arguments() {
        let snippet = parse_snippet("\n\nworkdir   /srv/app  \n").expect("should parse");
        let instr = snippet.instructions().next().expect("instruction");
        assert_eq!(instr.line, 3);
        assert_eq!(instr.keyword, Keyword::Workdir);
        assert_eq!(instr.arguments, "/srv/app");
        assert_eq!(instr.original, "workdir   /srv/app  ");
    }

    #[test]
    fn unknown_keyword_is_unparseable() {
        let err = parse_snippet("RUN true\nINSTALL python\n").unwrap_err();
        assert_eq!(
            err,
            SnippetError::Unparseable {
                line: 2,
                message: "unknown instruction INSTALL".into()
            }
        );
    }

    #[test]
    fn non_keyword_line_is_unparseable() {
        let err = parse_snippet("./configure --prefix=/usr\n").unwrap_err();
        assert!(matches!(err, SnippetError::Unparseable { line: 1, .. }));
    }

    #[test]
    fn copy_shell_form() {
        let args = parse_copy(&only_instruction("COPY a/b c")).expect("copy");
        assert_eq!(args.sources, vec!["a/b"]);
        assert_eq!(args.destination, "c");
        assert_eq!(args.form, ArgForm::Shell);
        assert!(args.flags.is_empty());
    }

    #[test]
    fn copy_with_flags_and_many_sources() {
        let args =
            parse_copy(&only_instruction("COPY --chown=app:app --chmod=644 a b c /dst/")).expect("copy");
        assert_eq!(args.flags, vec!["--chown=app:app", "--chmod=644"]);
        assert_eq!(args.sources, vec!["a", "b", "c"]);
        assert_eq!(args.destination, "/dst/");
    }

    #[test]
    fn copy_json_form() {
        let args = parse_copy(&only_instruction(r#"COPY ["my file", "/opt/my file"]"#)).expect("copy");
        assert_eq!(args.form, ArgForm::Json);
        assert_eq!(args.sources, vec!["my file"]);
        assert_eq!(args.destination, "/opt/my file");
    }

    #[test]
    fn copy_spanning_continuation_lines() {
        let args = parse_copy(&only_instruction("COPY a \\\n     b \\\n     /dst/")).expect("copy");
        assert_eq!(args.sources, vec!["a", "b"]);
        assert_eq!(args.destination, "/dst/");
    }

    #[test]
    fn copy_with_single_path_is_malformed() {
        let err = parse_snippet("RUN true\nCOPY only-one\n").unwrap_err();
        assert_eq!(
            err,
            SnippetError::MalformedCopy {
                line: 2,
                instruction: "COPY only-one".into()
            }
        );
    }

    #[test]
    fn bare_copy_is_malformed() {
        assert!(matches!(
            parse_snippet("COPY").unwrap_err(),
            SnippetError::MalformedCopy { line: 1, .. }
        ));
    }

    #[test]
    fn copy_with_broken_json_is_unparseable() {
        assert!(matches!(
            parse_snippet(r#"COPY ["a", "b""#).unwrap_err(),
            SnippetError::Unparseable { line: 1, .. }
        ));
    }

    #[test]
    fn error_conversion_attaches_feature() {
        let err = SnippetError::MalformedCopy {
            line: 4,
            instruction: "COPY x".into(),
        }
        .into_featurize("webapp");
        assert!(matches!(
            err,
            FeaturizeError::MalformedCopyInstruction { ref feature, line: 4, .. } if feature == "webapp"
        ));
    }
}
