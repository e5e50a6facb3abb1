//! Template regeneration with Tera.
//!
//! Templates see four variables:
//!
//! - `version`: the rendered version, e.g. `0.1.30888`
//! - `tag`: the git tag, e.g. `v0.1.30888`
//! - `base_url`: the base download URL
//! - `archives`: one object per platform in enumeration order, with `key`,
//!   `os`, `arch`, `filename`, `sha256` and `url`

use circleci_mirror_common::ManifestState;
use serde::Serialize;
use tera::{Context, Tera};

/// One platform entry as seen by templates.
#[derive(Debug, Serialize)]
struct ArchiveContext {
    key: String,
    os: &'static str,
    arch: &'static str,
    filename: String,
    sha256: String,
    url: String,
}

/// Build the template context for `state`.
#[must_use]
pub fn template_context(state: &ManifestState) -> Context {
    let archives: Vec<ArchiveContext> = state
        .archives()
        .iter()
        .map(|(key, entry)| ArchiveContext {
            key: key.to_string(),
            os: key.os().as_str(),
            arch: key.arch().as_str(),
            filename: entry.filename.clone(),
            sha256: entry.sha256.to_string(),
            url: state.archive_url(*key).unwrap_or_default(),
        })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("version", &state.version().to_string());
    ctx.insert("tag", &state.version().tag());
    ctx.insert("base_url", state.base_url());
    ctx.insert("archives", &archives);
    ctx
}

/// Render the template `source`, registered under `name`, for `state`.
///
/// # Errors
///
/// Returns [`tera::Error`] if the template does not parse or references an
/// unknown variable.
pub fn render_template(name: &str, source: &str, state: &ManifestState) -> tera::Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, source)?;
    tera.render(name, &template_context(state))
}

/// Flatten a Tera error and its causes into one line.
pub(crate) fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest_writer::test_support::sample_state;
    use rstest::rstest;

    #[rstest]
    fn renders_scalar_variables() {
        let rendered = render_template(
            "scalars",
            "{{ version }} {{ tag }} {{ base_url }}",
            &sample_state(),
        )
        .expect("render");
        assert_eq!(
            rendered,
            "0.1.30888 v0.1.30888 https://github.com/CircleCI-Public/circleci-cli/releases/download"
        );
    }

    #[rstest]
    fn archives_iterate_in_key_order() {
        let rendered = render_template(
            "keys",
            "{% for a in archives %}{{ a.key }}={{ a.os }}/{{ a.arch }};{% endfor %}",
            &sample_state(),
        )
        .expect("render");
        assert_eq!(
            rendered,
            "darwin_amd64=darwin/amd64;darwin_arm64=darwin/arm64;linux_amd64=linux/amd64;\
             linux_arm64=linux/arm64;windows_amd64=windows/amd64;windows_arm64=windows/arm64;"
        );
    }

    #[rstest]
    fn archive_url_points_at_tag_directory() {
        let rendered = render_template(
            "url",
            "{% for a in archives %}{% if a.key == \"windows_amd64\" %}{{ a.url }}{% endif %}{% endfor %}",
            &sample_state(),
        )
        .expect("render");
        assert!(rendered.ends_with("/v0.1.30888/circleci-cli_0.1.30888_windows_amd64.zip"));
    }

    #[test]
    fn unknown_variable_fails_with_cause() {
        let err = render_template("bad", "{{ checksum }}", &sample_state())
            .expect_err("unknown variable rejected");
        assert!(describe_tera_error(&err).contains("checksum"));
    }
}
