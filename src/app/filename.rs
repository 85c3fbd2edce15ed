//! Output filename generation from profile metadata
//!
//! Templates use `{{id}}`, `{{title}}`, `{{nickname}}` and `{{spec}}`
//! placeholders. The rendered name is sanitized so it is safe as a single
//! path component on every platform.

use crate::app::models::{spec_format, MediaSpec, Profile};
use crate::constants::{files, template};
use crate::errors::{ProfileError, ProfileResult};

/// Render `template_str` for `profile` and sanitize the result
///
/// Falls back to the profile id when the template renders to nothing usable.
///
/// # Errors
///
/// Returns `ProfileError::FilenameGeneration` if neither the template nor the
/// profile id yield a non-empty name
pub fn build_filename(
    profile: &Profile,
    spec: Option<&MediaSpec>,
    template_str: &str,
) -> ProfileResult<String> {
    let template_str = if template_str.trim().is_empty() {
        template::DEFAULT_TEMPLATE
    } else {
        template_str
    };

    let placeholders = [
        (template::ID, profile.id.as_str()),
        (template::TITLE, profile.title.as_str()),
        (template::NICKNAME, profile.nickname.as_str()),
        (template::SPEC, spec_format(spec)),
    ];
    let rendered = render(template_str, &placeholders);

    let name = sanitize_filename(&rendered);
    if !name.is_empty() {
        return Ok(name);
    }

    let fallback = sanitize_filename(&profile.id);
    if fallback.is_empty() {
        return Err(ProfileError::FilenameGeneration {
            id: profile.id.clone(),
        });
    }
    tracing::debug!(
        "Template {:?} rendered empty for {}, using id",
        template_str,
        profile.id
    );
    Ok(fallback)
}

/// Fill placeholders in one left-to-right pass
///
/// Substituted values are never scanned again, so a title that contains
/// placeholder text stays literal.
fn render(template_str: &str, placeholders: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template_str.len());
    let mut rest = template_str;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        match placeholders.iter().find(|(name, _)| rest.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &rest[name.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &rest[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Make `raw` safe to use as a single filename component
pub fn sanitize_filename(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() && !c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());

    let capped: String = trimmed.chars().take(files::MAX_FILENAME_CHARS).collect();
    capped
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}
