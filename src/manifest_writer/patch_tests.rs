//! Unit tests for in-place constant patching.

use super::*;
use crate::manifest_writer::test_support::{sample_state, sample_state_for};
use rstest::{fixture, rstest};

const LEGACY_SETUP: &str = r#"import os
import sys

# The mapping below is regenerated; braces in comments like { are ignored.
VERSION = "0.1.9321"
ARCHIVE_SHA256 = {'linux_amd64': ('old.tar.gz', '0000000000000000000000000000000000000000000000000000000000000000'), 'note': "}"}
RELEASES_BASE_URL = "https://example.test/old"


def get_download_url(key):
    filename, _ = ARCHIVE_SHA256[key]
    return f"{RELEASES_BASE_URL}/v{VERSION}/{filename}"


setup(name="circleci", version=VERSION)
"#;

#[fixture]
fn target() -> PatchTarget {
    PatchTarget::new("setup.py")
}

#[rstest]
fn patch_replaces_only_anchored_values(target: PatchTarget) {
    let state = sample_state();
    let patched = patch_source(LEGACY_SETUP, &target, &state).expect("patch");

    assert!(patched.contains("VERSION = \"0.1.30888\"\n"));
    assert!(patched.contains(
        "RELEASES_BASE_URL = \"https://github.com/CircleCI-Public/circleci-cli/releases/download\"\n"
    ));
    assert!(patched.contains(
        "    \"linux_amd64\": (\"circleci-cli_0.1.30888_linux_amd64.tar.gz\", \"12b6d549ec86d381a4e847f02ebd1e85a062c26930b28d184cc48dd413869c0e\"),\n"
    ));
    assert!(!patched.contains("'note'"));

    let (head, _) = LEGACY_SETUP
        .split_once("VERSION = ")
        .expect("legacy header");
    let (_, tail) = LEGACY_SETUP
        .split_once("\n\n\ndef get_download_url")
        .expect("legacy tail");
    assert!(patched.starts_with(head));
    assert!(patched.ends_with(tail));
}

#[rstest]
fn patched_file_reads_back_to_the_same_state(target: PatchTarget) {
    let state = sample_state();
    let patched = patch_source(LEGACY_SETUP, &target, &state).expect("patch");
    assert_eq!(read_patched_state(&patched, &target).expect("read back"), state);
}

#[rstest]
fn patching_is_idempotent(target: PatchTarget) {
    let state = sample_state();
    let once = patch_source(LEGACY_SETUP, &target, &state).expect("patch");
    let twice = patch_source(&once, &target, &state).expect("patch again");
    assert_eq!(once, twice);
}

#[rstest]
fn later_versions_overwrite_earlier_ones(target: PatchTarget) {
    let first = patch_source(LEGACY_SETUP, &target, &sample_state()).expect("patch");
    let next = sample_state_for(Version::new(0, 1, 30889));
    let second = patch_source(&first, &target, &next).expect("patch");
    assert_eq!(read_patched_state(&second, &target).expect("read back"), next);
}

#[rstest]
fn reads_single_line_mapping_with_single_quotes(target: PatchTarget) {
    let state = sample_state();
    let entries: Vec<String> = state
        .archives()
        .iter()
        .map(|(key, entry)| format!("'{key}': ('{}', '{}')", entry.filename, entry.sha256))
        .collect();
    let source = format!(
        "VERSION = '0.1.30888'\nARCHIVE_SHA256 = {{{}}}\nRELEASES_BASE_URL = '{}'\n",
        entries.join(", "),
        state.base_url()
    );
    assert_eq!(read_patched_state(&source, &target).expect("read"), state);
}

#[rstest]
fn nested_mapping_keeps_indentation(target: PatchTarget) {
    let source = "if True:\n    VERSION = '1'\n    ARCHIVE_SHA256 = {}\n    RELEASES_BASE_URL = ''\n";
    let patched = patch_source(source, &target, &sample_state()).expect("patch");
    assert!(patched.contains("    ARCHIVE_SHA256 = {\n        \"darwin_amd64\""));
    assert!(patched.contains("\n    }\n    RELEASES_BASE_URL = '"));
}

#[rstest]
#[case::missing("VERSION = '1'\nRELEASES_BASE_URL = ''\n", "no assignment to ARCHIVE_SHA256")]
#[case::duplicate(
    "VERSION = '1'\nVERSION = '2'\nARCHIVE_SHA256 = {}\nRELEASES_BASE_URL = ''\n",
    "VERSION is assigned more than once"
)]
#[case::wrong_shape(
    "VERSION = 1\nARCHIVE_SHA256 = {}\nRELEASES_BASE_URL = ''\n",
    "VERSION must be assigned a string literal"
)]
#[case::unbalanced(
    "VERSION = '1'\nRELEASES_BASE_URL = ''\nARCHIVE_SHA256 = {'a': ('b', 'c')\n",
    "is not closed"
)]
fn patch_rejects_malformed_targets(
    target: PatchTarget,
    #[case] source: &str,
    #[case] message: &str,
) {
    let err = patch_source(source, &target, &sample_state()).expect_err("rejected");
    assert!(
        err.to_string().contains(message),
        "expected '{message}' in '{err}'"
    );
}

#[rstest]
fn comparison_and_keyword_uses_are_not_assignments(target: PatchTarget) {
    let source = "if VERSION == '1': pass\nsetup(VERSION='2')\nVERSION = '3'\nARCHIVE_SHA256 = {}\nRELEASES_BASE_URL = ''\n";
    let patched = patch_source(source, &target, &sample_state()).expect("patch");
    assert!(patched.starts_with("if VERSION == '1': pass\nsetup(VERSION='2')\nVERSION = '0.1.30888'\n"));
}

#[rstest]
fn custom_anchor_names_are_honoured() {
    let target = PatchTarget {
        path: "pkg.py".into(),
        version_anchor: "CLI_VERSION".to_owned(),
        archives_anchor: "ASSETS".to_owned(),
        base_url_anchor: "BASE".to_owned(),
    };
    let source = "CLI_VERSION = ''\nASSETS = {}\nBASE = ''\n";
    let patched = patch_source(source, &target, &sample_state()).expect("patch");
    assert_eq!(
        read_patched_state(&patched, &target).expect("read back"),
        sample_state()
    );
}

#[rstest]
fn incomplete_mapping_is_rejected_on_read(target: PatchTarget) {
    let source = format!(
        "VERSION = '0.1.30888'\nARCHIVE_SHA256 = {{'linux_amd64': ('f', '{}')}}\nRELEASES_BASE_URL = ''\n",
        "a".repeat(64)
    );
    let err = read_patched_state(&source, &target).expect_err("incomplete");
    assert!(matches!(
        err,
        PatchError::Model(ModelError::IncompleteManifest { .. })
    ));
}
