//! Dockerfile composition.
//!
//! Concatenates the build snippets of an ordered feature list under one
//! `FROM` line. Every feature's block opens with its marker comment, and
//! COPY sources from the build context are moved under the feature's own
//! directory so that files of different features cannot collide.

use featurize_common::constants::{DEFAULT_ENTRYPOINT, escape_markers, feature_marker};
use featurize_common::error::{FeaturizeError, Result};
use featurize_common::types::Feature;

use crate::parser::ast::{Item, Keyword};
use crate::parser::{self, parse_copy, validator};

/// Renders build descriptors with a fixed closing command.
#[derive(Debug, Clone)]
pub struct Composer {
    entrypoint: String,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRYPOINT)
    }
}

impl Composer {
    /// Creates a composer closing every descriptor with `CMD <entrypoint>`.
    #[must_use]
    pub fn new(entrypoint: impl Into<String>) -> Self {
        Self {
            entrypoint: entrypoint.into(),
        }
    }

    /// Returns the command of the closing directive.
    #[must_use]
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    /// Composes the Dockerfile for `features`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an empty or multi-line base image,
    /// `SnippetParse` for a snippet that does not parse, and
    /// `MalformedCopyInstruction` for a COPY without a destination. Nothing
    /// is returned on error.
    pub fn compose(&self, base_image: &str, features: &[&Feature]) -> Result<String> {
        check_single_line("base image", base_image)?;
        check_single_line("entrypoint", &self.entrypoint)?;

        let mut out = format!("FROM {}\n", base_image.trim());
        for feature in features {
            check_feature_name(feature.name())?;
            out.push('\n');
            out.push_str(&feature_marker(feature.name()));
            out.push('\n');
            for line in render_feature(feature)? {
                out.push_str(&escape_markers(&line));
                out.push('\n');
            }
        }
        out.push('\n');
        out.push_str("CMD ");
        out.push_str(self.entrypoint.trim());
        out.push('\n');

        tracing::debug!(
            base = base_image,
            features = features.len(),
            bytes = out.len(),
            "composed build descriptor"
        );
        Ok(out)
    }
}

/// Composes with the default closing command.
///
/// # Errors
///
/// See [`Composer::compose`].
pub fn compose(base_image: &str, features: &[&Feature]) -> Result<String> {
    Composer::default().compose(base_image, features)
}

fn check_single_line(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FeaturizeError::Config {
            message: format!("{what} must not be empty"),
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(FeaturizeError::Config {
            message: format!("{what} must be a single line: {value:?}"),
        });
    }
    Ok(())
}

/// Rejects names that cannot stand on a marker line of their own.
fn check_feature_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains(['\n', '\r']) {
        return Err(FeaturizeError::Config {
            message: format!("feature name must be a non-empty single line: {name:?}"),
        });
    }
    Ok(())
}

/// Renders one feature's snippet, namespaced, as output lines.
///
/// Blank lines at the end of the snippet are dropped.
///
/// # Errors
///
/// Returns the snippet's parse error with the feature attached.
pub fn render_feature(feature: &Feature) -> Result<Vec<String>> {
    let name = feature.name();
    let snippet =
        parser::parse_snippet(&feature.snippet).map_err(|e| e.into_featurize(name))?;

    for warning in validator::validate(&snippet) {
        tracing::warn!(feature = name, line = warning.line, "{}", warning.message);
    }

    let mut lines = Vec::with_capacity(snippet.items.len());
    for item in &snippet.items {
        match item {
            Item::Trivia(trivia) => lines.push(trivia.text.clone()),
            Item::Instruction(instr) if instr.keyword == Keyword::Copy => {
                let mut args = parse_copy(instr).map_err(|e| e.into_featurize(name))?;
                if args.from_stage().is_some() {
                    lines.push(instr.original.clone());
                    continue;
                }
                args.sources = args
                    .sources
                    .iter()
                    .map(|src| namespace_source(name, src))
                    .collect();
                lines.push(args.render());
            }
            Item::Instruction(instr) => lines.push(instr.original.clone()),
        }
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        let _ = lines.pop();
    }
    Ok(lines)
}

/// Moves a COPY source under the feature's directory.
///
/// `./` and `/` prefixes are stripped first, so `./a`, `/a` and `a` all
/// become `<feature>/a`; the context root `.` becomes `<feature>`.
#[must_use]
pub fn namespace_source(feature: &str, source: &str) -> String {
    let mut rest = source;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    if rest.is_empty() || rest == "." {
        feature.to_string()
    } else {
        format!("{feature}/{rest}")
    }
}

#[cfg(test)]
mod tests {
    use featurize_common::constants::feature_markers;
    use featurize_common::types::FeatureMeta;

    use super::*;

    fn feature(name: &str, snippet: &str) -> Feature {
        Feature::new(FeatureMeta::new(name, Vec::<String>::new()), snippet, "")
    }

    #[test]
    fn no_features_gives_from_and_cmd() {
        let out = compose("ubuntu:20.04", &[]).expect("compose");
        assert_eq!(out, "FROM ubuntu:20.04\n\nCMD /bin/bash\n");
    }

    #[test]
    fn copy_source_is_namespaced() {
        let foo = feature("foo", "COPY a/b c\n");
        let out = compose("ubuntu:20.04", &[&foo]).expect("compose");
        assert!(out.contains("\nCOPY foo/a/b c\n"), "got: {out}");
        assert!(!out.contains("COPY a/b c"));
    }

    #[test]
    fn layout_of_two_features() {
        let a = feature("a", "RUN echo a\n");
        let b = feature("b", "# b things\nRUN echo b\n\n\n");
        let out = Composer::new("/bin/sh").compose("alpine:3.19", &[&a, &b]).expect("compose");
        assert_eq!(
            out,
            "FROM alpine:3.19\n\n# feature: a\nRUN echo a\n\n# feature: b\n# b things\nRUN echo b\n\nCMD /bin/sh\n"
        );
    }

    #[test]
    fn non_copy_instructions_pass_through_verbatim() {
        let snippet = "run   apt-get update && \\\n    apt-get install -y curl\nENV  A=1   B=2";
        let f = feature("tools", snippet);
        let out = compose("debian", &[&f]).expect("compose");
        assert!(out.contains(snippet), "got: {out}");
    }

    #[test]
    fn crlf_instruction_bytes_are_kept() {
        let f = feature("win", "RUN echo a \\\r\n  && echo b\r\nCOPY a b\r\n");
        let out = compose("debian", &[&f]).expect("compose");
        assert!(out.contains("\nRUN echo a \\\r\n  && echo b\n"), "got: {out:?}");
        assert!(out.contains("\nCOPY win/a b\n"), "got: {out:?}");
    }

    #[test]
    fn copy_keeps_flags_and_json_form() {
        let f = feature(
            "web",
            "COPY --chown=www:www ./site /var/www\nCOPY [\"conf/nginx.conf\", \"/etc/nginx/\"]\n",
        );
        let out = compose("nginx", &[&f]).expect("compose");
        assert!(out.contains("COPY --chown=www:www web/site /var/www\n"), "got: {out}");
        assert!(out.contains("COPY [\"web/conf/nginx.conf\", \"/etc/nginx/\"]\n"), "got: {out}");
    }

    #[test]
    fn copy_from_stage_is_untouched() {
        let f = feature("bin", "COPY --from=builder /out/app /usr/local/bin/app\n");
        let out = compose("debian", &[&f]).expect("compose");
        assert!(out.contains("COPY --from=builder /out/app /usr/local/bin/app\n"));
    }

    #[test]
    fn multi_source_copy_namespaces_every_source() {
        let f = feature("x", "COPY a b /opt/\n");
        let out = compose("debian", &[&f]).expect("compose");
        assert!(out.contains("COPY x/a x/b /opt/\n"));
    }

    #[test]
    fn namespace_source_normalizes_prefixes() {
        assert_eq!(namespace_source("foo", "a/b"), "foo/a/b");
        assert_eq!(namespace_source("foo", "./a"), "foo/a");
        assert_eq!(namespace_source("foo", "/etc/x"), "foo/etc/x");
        assert_eq!(namespace_source("foo", "."), "foo");
        assert_eq!(namespace_source("foo", "./"), "foo");
        assert_eq!(namespace_source("foo", "*.py"), "foo/*.py");
    }

    #[test]
    fn malformed_copy_names_feature_and_line() {
        let f = feature("broken", "RUN true\nCOPY lonely\n");
        let err = compose("debian", &[&f]).unwrap_err();
        assert!(matches!(
            err,
            FeaturizeError::MalformedCopyInstruction { ref feature, line: 2, .. } if feature == "broken"
        ));
    }

    #[test]
    fn unparseable_snippet_fails_whole_composition() {
        let ok = feature("ok", "RUN true\n");
        let bad = feature("bad", "make install\n");
        let err = compose("debian", &[&ok, &bad]).unwrap_err();
        assert!(matches!(err, FeaturizeError::SnippetParse { ref feature, .. } if feature == "bad"));
    }

    #[test]
    fn empty_base_image_is_rejected() {
        assert!(matches!(compose("  ", &[]), Err(FeaturizeError::Config { .. })));
        assert!(matches!(
            compose("ubuntu\nRUN rm -rf /", &[]),
            Err(FeaturizeError::Config { .. })
        ));
    }

    #[test]
    fn feature_with_empty_snippet_still_gets_marker() {
        let f = feature("meta-only", "");
        let out = compose("debian", &[&f]).expect("compose");
        assert_eq!(out, "FROM debian\n\n# feature: meta-only\n\nCMD /bin/bash\n");
    }

    #[test]
    fn marker_lookalikes_in_snippets_are_escaped() {
        let java = feature(
            "java",
            "# feature: install the JDK\nRUN apt-get install -y openjdk-17-jdk && \\\n# feature: inside\n    java -version\n",
        );
        let out = compose("debian", &[&java]).expect("compose");
        assert_eq!(feature_markers(&out), vec!["java"]);
        assert!(out.contains("## feature: install the JDK\n"), "got: {out}");
        assert!(out.contains("## feature: inside\n"), "got: {out}");
    }

    #[test]
    fn multi_line_feature_names_are_rejected() {
        let f = feature("evil\n# feature: other", "RUN true\n");
        assert!(matches!(compose("debian", &[&f]), Err(FeaturizeError::Config { .. })));
        let f = feature("cr\r", "");
        assert!(matches!(compose("debian", &[&f]), Err(FeaturizeError::Config { .. })));
    }

    #[test]
    fn composing_twice_gives_same_output() {
        let f = feature("foo", "COPY a b\n");
        let first = compose("debian", &[&f]).expect("compose");
        let second = compose("debian", &[&f]).expect("compose");
        assert_eq!(first, second);
        assert!(!first.contains("foo/foo/"));
    }
}
