//! bats test manifest generation.

use featurize_common::constants::{TEST_MANIFEST_HEADER, escape_markers, feature_marker};
use featurize_common::types::Feature;

/// Writes the test manifest for `features`, in the given order.
///
/// Every feature gets its marker, even without tests, so the markers line up
/// one-to-one with the build descriptor's. Test lines that look like markers
/// are escaped.
#[must_use]
pub fn write_test_manifest(features: &[&Feature]) -> String {
    let mut out = String::from(TEST_MANIFEST_HEADER);
    out.push('\n');
    for feature in features {
        out.push('\n');
        out.push_str(&feature_marker(feature.name()));
        out.push('\n');
        let tests = feature.test_snippet.trim_end();
        if !tests.trim().is_empty() {
            out.push_str(&escape_markers(tests));
            out.push('\n');
        }
    }
    tracing::debug!(features = features.len(), "wrote test manifest");
    out
}

#[cfg(test)]
mod tests {
    use featurize_common::constants::feature_markers;
    use featurize_common::types::FeatureMeta;

    use super::*;

    fn feature(name: &str, tests: &str) -> Feature {
        Feature::new(FeatureMeta::new(name, Vec::<String>::new()), "", tests)
    }

    #[test]
    fn empty_list_is_just_the_header() {
        assert_eq!(write_test_manifest(&[]), "#!/usr/bin/env bats\n");
    }

    #[test]
    fn features_are_emitted_in_order_with_markers() {
        let a = feature("a", "@test \"a\" {\n  true\n}\n\n  ");
        let b = feature("b", "@test \"b\" { true; }");
        assert_eq!(
            write_test_manifest(&[&a, &b]),
            "#!/usr/bin/env bats\n\n# feature: a\n@test \"a\" {\n  true\n}\n\n# feature: b\n@test \"b\" { true; }\n"
        );
    }

    #[test]
    fn marker_lookalikes_in_tests_are_escaped() {
        let a = feature("a", "# feature: smoke tests\n@test \"a\" { true; }");
        let out = write_test_manifest(&[&a]);
        assert_eq!(feature_markers(&out), vec!["a"]);
        assert!(out.contains("## feature: smoke tests\n"));
    }

    #[test]
    fn empty_test_snippet_contributes_only_marker() {
        let a = feature("a", "");
        let b = feature("b", "@test \"b\" { true; }");
        let out = write_test_manifest(&[&a, &b]);
        assert_eq!(feature_markers(&out), vec!["a", "b"]);
        assert!(out.contains("# feature: a\n\n# feature: b\n"));
    }
}
