//! Behaviour tests for end-to-end release synchronisation.

use camino::Utf8PathBuf;
use circleci_mirror::checksums::{ChecksumResolver, ChecksumSource};
use circleci_mirror::config::{IncompletePolicy, PatchTarget, TemplateTarget};
use circleci_mirror::http::HttpError;
use circleci_mirror::manifest_writer::ManifestWriter;
use circleci_mirror::release_diff::ReleaseDiffEngine;
use circleci_mirror::release_feed::{FeedError, ReleaseFeed, ReleaseRecord};
use circleci_mirror::sync::{SyncReport, Synchroniser};
use circleci_mirror::tag_publisher::{GitError, GitExecutor, TagPublisher};
use circleci_mirror_common::{ArchiveKey, ArchiveNaming, ManifestState, Version};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::collections::BTreeSet;
use std::sync::Mutex;

const UPSTREAM: &str = "CircleCI-Public/circleci-cli";
const MIRROR: &str = "AleksaC/circleci-cli-py";
const BASE_URL: &str = "https://github.com/CircleCI-Public/circleci-cli/releases/download";

const CHECKSUMS_0_1_30888: &str = "\
eb56773a9b42839c8605286cc3f1bcb37b91c963f6b7253742e05fd24f39810b  circleci-cli_0.1.30888_darwin_amd64.tar.gz
6070548dd31a0a0c9e18a488b01a97dfc153d8756e9168aff5e16430ac2ba260  circleci-cli_0.1.30888_darwin_arm64.tar.gz
12b6d549ec86d381a4e847f02ebd1e85a062c26930b28d184cc48dd413869c0e  circleci-cli_0.1.30888_linux_amd64.tar.gz
46b54f9ae39bd1ac3cb46ee9f9c2e0509be1bd6bf53f2dc334c39be525af0544  circleci-cli_0.1.30888_linux_arm64.tar.gz
2e7649aa3d45590bc6ce04a199b720db0724bf9f19e83f80f87278fa4fcc3603  circleci-cli_0.1.30888_windows_amd64.zip
dd2082bf328a05f0fbdb9e8a00cfb4d6ca6d1fb4bd2d3b4e98fde047173cffac  circleci-cli_0.1.30888_windows_arm64.zip
";

const RELEASE_TEMPLATE: &str = "\
# {{ version }}
{% for archive in archives -%}
- {{ archive.key }} {{ archive.sha256 }}
{% endfor -%}
";

const LEGACY_SETUP: &str = "\
VERSION = \"0.1.9321\"
ARCHIVE_SHA256 = {}
RELEASES_BASE_URL = \"https://example.test\"
";

/// Upstream feed and mirror repository sharing one tag list, so tags
/// created through git become visible to the next run.
#[derive(Default)]
struct StubRemote {
    releases: Mutex<Vec<ReleaseRecord>>,
    mirror_tags: Mutex<Vec<String>>,
    git_log: Mutex<Vec<String>>,
}

impl ReleaseFeed for StubRemote {
    fn releases_page(&self, repo: &str, page: u32) -> Result<Vec<ReleaseRecord>, FeedError> {
        assert_eq!(repo, UPSTREAM);
        let releases = self.releases.lock().expect("lock");
        Ok(if page == 1 { releases.clone() } else { Vec::new() })
    }

    fn tags_page(&self, repo: &str, page: u32) -> Result<Vec<String>, FeedError> {
        assert_eq!(repo, MIRROR);
        let tags = self.mirror_tags.lock().expect("lock");
        Ok(if page == 1 { tags.clone() } else { Vec::new() })
    }
}

impl GitExecutor for StubRemote {
    fn run(&self, args: &[String]) -> Result<String, GitError> {
        if let [command, tag] = args {
            if command == "tag" {
                self.mirror_tags.lock().expect("lock").push(tag.clone());
            }
        }
        let command = args.join(" ");
        self.git_log.lock().expect("lock").push(command.clone());
        if command.starts_with("diff --cached") {
            return Ok("manifest.json\n".to_owned());
        }
        Ok(String::new())
    }
}

/// Serves generated checksum manifests keyed by version.
#[derive(Default)]
struct StubChecksums {
    complete: bool,
    published: Vec<(Version, String)>,
    missing: BTreeSet<Version>,
}

impl StubChecksums {
    fn manifest_for(&self, version: Version) -> Option<String> {
        if self.missing.contains(&version) {
            return None;
        }
        if let Some((_, text)) = self.published.iter().find(|(v, _)| *v == version) {
            return Some(text.clone());
        }
        let naming = ArchiveNaming::default();
        self.complete.then(|| {
            ArchiveKey::all()
                .into_iter()
                .map(|key| {
                    format!(
                        "{}  {}\n",
                        "c".repeat(64),
                        naming.archive_filename(version, key)
                    )
                })
                .collect()
        })
    }
}

impl ChecksumSource for StubChecksums {
    fn fetch(&self, url: &str) -> Result<String, HttpError> {
        let version = url
            .rsplit('/')
            .nth(1)
            .and_then(|segment| Version::parse(segment).ok())
            .expect("versioned URL");
        self.manifest_for(version).ok_or_else(|| HttpError::NotFound {
            url: url.to_owned(),
        })
    }
}

struct SyncWorld {
    _temp_dir: tempfile::TempDir,
    repo: Utf8PathBuf,
    remote: StubRemote,
    checksums: StubChecksums,
    policy: IncompletePolicy,
    stderr: String,
    outcome: Option<Result<SyncReport, String>>,
}

#[fixture]
fn world() -> SyncWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let repo = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    std::fs::create_dir_all(repo.join("templates")).expect("templates dir");
    std::fs::write(repo.join("templates/RELEASE.md.tera"), RELEASE_TEMPLATE)
        .expect("write template");
    std::fs::write(repo.join("setup.py"), LEGACY_SETUP).expect("write setup.py");
    SyncWorld {
        _temp_dir: temp_dir,
        repo,
        remote: StubRemote::default(),
        checksums: StubChecksums::default(),
        policy: IncompletePolicy::Skip,
        stderr: String::new(),
        outcome: None,
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn manifest(world: &SyncWorld) -> ManifestState {
    let document =
        std::fs::read_to_string(world.repo.join("manifest.json")).expect("manifest written");
    ManifestState::from_document(&document).expect("valid manifest")
}

fn report(world: &SyncWorld) -> &SyncReport {
    match world.outcome.as_ref() {
        Some(Ok(report)) => report,
        Some(Err(error)) => panic!("expected the run to succeed: {error}"),
        None => panic!("the mirror should have been synchronised"),
    }
}

#[given("upstream releases \"{tags}\"")]
fn given_upstream_releases(world: &mut SyncWorld, tags: String) {
    *world.remote.releases.lock().expect("lock") = split_list(&tags)
        .into_iter()
        .map(ReleaseRecord::published)
        .collect();
}

#[given("mirrored tags \"{tags}\"")]
fn given_mirrored_tags(world: &mut SyncWorld, tags: String) {
    *world.remote.mirror_tags.lock().expect("lock") = split_list(&tags);
}

#[given("complete checksum manifests are published")]
fn given_complete_checksums(world: &mut SyncWorld) {
    world.checksums.complete = true;
}

#[given("the published checksum manifest for 0.1.30888")]
fn given_published_manifest(world: &mut SyncWorld) {
    world
        .checksums
        .published
        .push((Version::new(0, 1, 30888), CHECKSUMS_0_1_30888.to_owned()));
}

#[given("no checksum manifest exists for \"{version}\"")]
fn given_missing_manifest(world: &mut SyncWorld, version: String) {
    world
        .checksums
        .missing
        .insert(Version::parse(&version).expect("valid version"));
}

#[given("incomplete checksum manifests stop the run")]
fn given_stop_policy(world: &mut SyncWorld) {
    world.policy = IncompletePolicy::Stop;
}

#[when("the mirror is synchronised")]
fn when_synchronised(world: &mut SyncWorld) {
    let writer = ManifestWriter::new(
        world.repo.clone(),
        "manifest.json",
        vec![TemplateTarget {
            source: Utf8PathBuf::from("templates/RELEASE.md.tera"),
            destination: Utf8PathBuf::from("RELEASE.md"),
        }],
        vec![PatchTarget::new("setup.py")],
    );
    let synchroniser = Synchroniser::new(
        ReleaseDiffEngine::new(&world.remote, UPSTREAM, MIRROR, Some(Version::new(0, 1, 9321))),
        ChecksumResolver::new(&world.checksums, BASE_URL, ArchiveNaming::default()),
        writer,
        TagPublisher::new(&world.remote, false),
        world.policy,
    );

    let mut stderr = Vec::new();
    let outcome = synchroniser.run(&mut stderr).map_err(|err| err.to_string());
    world.stderr = String::from_utf8(stderr).expect("UTF-8 progress");
    world.outcome = Some(outcome);
}

#[when("the mirror is synchronised again")]
fn when_synchronised_again(world: &mut SyncWorld) {
    when_synchronised(world);
}

#[then("the run publishes \"{tags}\"")]
fn then_publishes(world: &mut SyncWorld, tags: String) {
    let published: Vec<String> = report(world).published.iter().map(Version::tag).collect();
    assert_eq!(published, split_list(&tags));
}

#[then("the last run publishes nothing")]
fn then_publishes_nothing(world: &mut SyncWorld) {
    assert!(report(world).is_empty());
    assert!(world.stderr.is_empty(), "unexpected progress: {}", world.stderr);
}

#[then("the run skips \"{tags}\"")]
fn then_skips(world: &mut SyncWorld, tags: String) {
    let skipped: Vec<String> = report(world)
        .skipped
        .iter()
        .map(|skipped| skipped.version.tag())
        .collect();
    assert_eq!(skipped, split_list(&tags));
}

#[then("the run fails mentioning \"{snippet}\"")]
fn then_fails(world: &mut SyncWorld, snippet: String) {
    match world.outcome.as_ref() {
        Some(Err(error)) => assert!(
            error.contains(&snippet),
            "expected error to mention '{snippet}', got: {error}"
        ),
        other => panic!("expected the run to fail, got {other:?}"),
    }
}

#[then("progress reads \"{line}\"")]
fn then_progress_reads(world: &mut SyncWorld, line: String) {
    assert_eq!(world.stderr, format!("{line}\n"));
}

#[then("git ran \"{commands}\"")]
fn then_git_ran(world: &mut SyncWorld, commands: String) {
    assert_eq!(*world.remote.git_log.lock().expect("lock"), split_list(&commands));
}

#[then("no git commands ran")]
fn then_no_git(world: &mut SyncWorld) {
    assert!(world.remote.git_log.lock().expect("lock").is_empty());
}

#[then("the manifest records version \"{version}\"")]
fn then_manifest_version(world: &mut SyncWorld, version: String) {
    assert_eq!(manifest(world).version().to_string(), version);
}

#[then("the manifest lists {count} archives")]
fn then_manifest_archives(world: &mut SyncWorld, count: usize) {
    assert_eq!(manifest(world).archives().len(), count);
}

#[then("the manifest digest for \"{key}\" is \"{digest}\"")]
fn then_manifest_digest(world: &mut SyncWorld, key: String, digest: String) {
    let key: ArchiveKey = key.parse().expect("valid archive key");
    let state = manifest(world);
    let entry = state.entry(key).expect("entry present");
    assert_eq!(entry.sha256.as_str(), digest);
}

#[then("the rendered release notes list {count} archives")]
fn then_release_notes(world: &mut SyncWorld, count: usize) {
    let notes = std::fs::read_to_string(world.repo.join("RELEASE.md")).expect("notes written");
    assert_eq!(notes.lines().filter(|line| line.starts_with("- ")).count(), count);
}

#[then("the legacy setup script names version \"{version}\"")]
fn then_setup_version(world: &mut SyncWorld, version: String) {
    let setup = std::fs::read_to_string(world.repo.join("setup.py")).expect("setup.py");
    assert!(
        setup.starts_with(&format!("VERSION = \"{version}\"\n")),
        "unexpected setup.py: {setup}"
    );
}

#[scenario(path = "tests/features/sync.feature", name = "A single new release is mirrored")]
fn scenario_single_release(world: SyncWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sync.feature", name = "A second run changes nothing")]
fn scenario_second_run(world: SyncWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/sync.feature",
    name = "The published checksum manifest covers every platform"
)]
fn scenario_published_checksums(world: SyncWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/sync.feature",
    name = "A release without checksums is skipped"
)]
fn scenario_skip_missing_checksums(world: SyncWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/sync.feature",
    name = "Stopping on a missing checksum manifest"
)]
fn scenario_stop_on_missing_checksums(world: SyncWorld) {
    let _ = world;
}
