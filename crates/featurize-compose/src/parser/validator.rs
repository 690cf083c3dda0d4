//! Static checks on parsed snippets.
//!
//! None of these stop composition: they flag instructions that are legal
//! Dockerfile but surprising inside a feature, where the composer owns the
//! image's first and last directives.

use super::ast::{Keyword, Snippet};
use super::parse_copy;

/// A non-fatal finding about a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Line of the instruction the warning refers to.
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

/// Lints a parsed snippet.
///
/// # Checks performed
///
/// 1. `FROM` starts a new build stage and discards everything before it.
/// 2. `CMD` and `ENTRYPOINT` are overridden by the closing directive.
/// 3. `ADD` bypasses source namespacing.
#[must_use]
pub fn validate(snippet: &Snippet) -> Vec<Warning> {
    let mut warnings = Vec::new();
    check_stage_changes(snippet, &mut warnings);
    check_overridden_commands(snippet, &mut warnings);
    check_unscoped_sources(snippet, &mut warnings);
    warnings
}

fn check_stage_changes(snippet: &Snippet, warnings: &mut Vec<Warning>) {
    for instr in snippet.instructions().filter(|i| i.keyword == Keyword::From) {
        warnings.push(Warning {
            line: instr.line,
            message: "FROM inside a feature starts a new stage and drops earlier features".into(),
        });
    }
}

fn check_overridden_commands(snippet: &Snippet, warnings: &mut Vec<Warning>) {
    for instr in snippet
        .instructions()
        .filter(|i| matches!(i.keyword, Keyword::Cmd | Keyword::Entrypoint))
    {
        warnings.push(Warning {
            line: instr.line,
            message: format!("{} is overridden by the generated CMD", instr.keyword),
        });
    }
}

fn check_unscoped_sources(snippet: &Snippet, warnings: &mut Vec<Warning>) {
    for instr in snippet.instructions() {
        match instr.keyword {
            Keyword::Add => warnings.push(Warning {
                line: instr.line,
                message: "ADD sources are not namespaced; prefer COPY".into(),
            }),
            Keyword::Copy => {
                let absolute = parse_copy(instr).is_ok_and(|args| {
                    args.from_stage().is_none() && args.sources.iter().any(|s| s.starts_with('/'))
                });
                if absolute {
                    warnings.push(Warning {
                        line: instr.line,
                        message: "absolute COPY source is resolved inside the feature directory"
                            .into(),
                    });
                }
            }
            _ => {}
        }
    }
}
