//! Syntax tree for Dockerfile snippets.

use std::fmt;

/// A parsed feature snippet: its lines in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snippet {
    /// Comments, blank lines and instructions.
    pub items: Vec<Item>,
}

impl Snippet {
    /// Iterates over the instructions, skipping trivia.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            Item::Instruction(instr) => Some(instr),
            Item::Trivia(_) => None,
        })
    }
}

/// One top-level element of a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A comment or blank line, kept verbatim.
    Trivia(Trivia),
    /// A Dockerfile instruction, possibly spanning continuation lines.
    Instruction(Instruction),
}

/// A comment or blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    /// 1-based line number.
    pub line: usize,
    /// Line text without its line terminator.
    pub text: String,
}

impl Trivia {
    /// Returns `true` for a whitespace-only line.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A single Dockerfile instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// 1-based line number of the first physical line.
    pub line: usize,
    /// Instruction kind.
    pub keyword: Keyword,
    /// Exact source text, continuation lines included, without the final
    /// line terminator.
    pub original: String,
    /// Arguments after the keyword, with continuations joined by a space.
    pub arguments: String,
}

/// Instruction keywords understood in feature snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `ADD`
    Add,
    /// `ARG`
    Arg,
    /// `CMD`
    Cmd,
    /// `COPY`
    Copy,
    /// `ENTRYPOINT`
    Entrypoint,
    /// `ENV`
    Env,
    /// `EXPOSE`
    Expose,
    /// `FROM`
    From,
    /// `HEALTHCHECK`
    Healthcheck,
    /// `LABEL`
    Label,
    /// `MAINTAINER`
    Maintainer,
    /// `ONBUILD`
    Onbuild,
    /// `RUN`
    Run,
    /// `SHELL`
    Shell,
    /// `STOPSIGNAL`
    Stopsignal,
    /// `USER`
    User,
    /// `VOLUME`
    Volume,
    /// `WORKDIR`
    Workdir,
}

impl Keyword {
    /// Matches a keyword case-insensitively.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "ADD" => Self::Add,
            "ARG" => Self::Arg,
            "CMD" => Self::Cmd,
            "COPY" => Self::Copy,
            "ENTRYPOINT" => Self::Entrypoint,
            "ENV" => Self::Env,
            "EXPOSE" => Self::Expose,
            "FROM" => Self::From,
            "HEALTHCHECK" => Self::Healthcheck,
            "LABEL" => Self::Label,
            "MAINTAINER" => Self::Maintainer,
            "ONBUILD" => Self::Onbuild,
            "RUN" => Self::Run,
            "SHELL" => Self::Shell,
            "STOPSIGNAL" => Self::Stopsignal,
            "USER" => Self::User,
            "VOLUME" => Self::Volume,
            "WORKDIR" => Self::Workdir,
            _ => return None,
        };
        Some(keyword)
    }

    /// Canonical upper-case spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Arg => "ARG",
            Self::Cmd => "CMD",
            Self::Copy => "COPY",
            Self::Entrypoint => "ENTRYPOINT",
            Self::Env => "ENV",
            Self::Expose => "EXPOSE",
            Self::From => "FROM",
            Self::Healthcheck => "HEALTHCHECK",
            Self::Label => "LABEL",
            Self::Maintainer => "MAINTAINER",
            Self::Onbuild => "ONBUILD",
            Self::Run => "RUN",
            Self::Shell => "SHELL",
            Self::Stopsignal => "STOPSIGNAL",
            Self::User => "USER",
            Self::Volume => "VOLUME",
            Self::Workdir => "WORKDIR",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a COPY instruction spelled its paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgForm {
    /// `COPY src dest`
    Shell,
    /// `COPY ["src", "dest"]`
    Json,
}

/// Decoded arguments of a COPY instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyArgs {
    /// Leading `--flag[=value]` options, verbatim.
    pub flags: Vec<String>,
    /// Source paths (one or more).
    pub sources: Vec<String>,
    /// Destination path.
    pub destination: String,
    /// Spelling of the path list.
    pub form: ArgForm,
}

impl CopyArgs {
    /// Returns the stage named by `--from=`, if any.
    #[must_use]
    pub fn from_stage(&self) -> Option<&str> {
        self.flags.iter().find_map(|f| f.strip_prefix("--from="))
    }

    /// Renders the instruction on a single line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = vec![Keyword::Copy.as_str().to_string()];
        parts.extend(self.flags.iter().cloned());
        match self.form {
            ArgForm::Shell => {
                parts.extend(self.sources.iter().cloned());
                parts.push(self.destination.clone());
            }
            ArgForm::Json => {
                let quoted: Vec<String> = self
                    .sources
                    .iter()
                    .chain(std::iter::once(&self.destination))
                    .map(|s| json_quote(s))
                    .collect();
                parts.push(format!("[{}]", quoted.join(", ")));
            }
        }
        parts.join(" ")
    }
}

fn json_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
