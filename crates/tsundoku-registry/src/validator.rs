// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation of a parsed host manifest.
//!
//! Pure and I/O free. Rules are checked in a fixed order and the first
//! violation wins:
//!
//! 1. host `name`, `author` and `repository` are non-empty;
//! 2. at least one source is declared;
//! 3. per source: `name` and `slug` non-empty, `url` is an absolute http(s)
//!    URL, the slug is path-safe and unique within the host, at least one
//!    language, `icon` is an http(s) URL, any `referer` / `searchPath`
//!    is well formed, and tag slugs are non-empty and unique per source;
//! 4. the URL the manifest was fetched from is http(s);
//! 5. every preset stays inside its source's declared capabilities.

use std::collections::HashSet;

use tsundoku_core::{BusinessError, MAX_QUERY_CHARS, MAX_RESULTS};
use url::Url;

use crate::manifest::{HostManifest, PresetManifest, SourceManifest};

fn malformed(reason: impl Into<String>) -> BusinessError {
    BusinessError::MalformedManifest {
        reason: reason.into(),
    }
}

/// True when `raw` parses as an absolute URL with an http or https scheme.
pub fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// Slugs become file names, so only `[A-Za-z0-9._-]` without a leading dot.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Validate a manifest fetched from `host_url`.
pub fn validate(manifest: &HostManifest, host_url: &str) -> Result<(), BusinessError> {
    if manifest.name.trim().is_empty() {
        return Err(malformed("host name must not be empty"));
    }
    if manifest.author.trim().is_empty() {
        return Err(malformed("host author must not be empty"));
    }
    if manifest.repository.trim().is_empty() {
        return Err(malformed("host repository must not be empty"));
    }

    if manifest.sources.is_empty() {
        return Err(BusinessError::NoSourcesInHost);
    }

    let mut slugs = HashSet::with_capacity(manifest.sources.len());
    for (index, source) in manifest.sources.iter().enumerate() {
        validate_source(index, source)?;
        if !slugs.insert(source.slug.as_str()) {
            return Err(malformed(format!(
                "source slug `{}` is declared more than once",
                source.slug
            )));
        }
    }

    if !is_http_url(host_url) {
        return Err(malformed(format!(
            "host URL `{host_url}` must be an absolute http or https URL"
        )));
    }

    for source in &manifest.sources {
        for preset in &source.presets {
            validate_preset(source, preset)?;
        }
    }

    Ok(())
}

fn validate_source(index: usize, source: &SourceManifest) -> Result<(), BusinessError> {
    if source.name.trim().is_empty() {
        return Err(malformed(format!("source #{index} has an empty name")));
    }
    if source.slug.is_empty() {
        return Err(malformed(format!(
            "source `{}` has an empty slug",
            source.name
        )));
    }
    if !is_http_url(&source.url) {
        return Err(malformed(format!(
            "source `{}` base URL `{}` must be an absolute http or https URL",
            source.slug, source.url
        )));
    }
    if !is_valid_slug(&source.slug) {
        return Err(malformed(format!(
            "source slug `{}` may only contain letters, digits, '.', '_' and '-' and must not start with '.'",
            source.slug
        )));
    }
    if source.languages.iter().all(|lang| lang.trim().is_empty()) {
        return Err(malformed(format!(
            "source `{}` declares no languages",
            source.slug
        )));
    }
    if !is_http_url(&source.icon) {
        return Err(malformed(format!(
            "source `{}` icon `{}` must be an http or https URL",
            source.slug, source.icon
        )));
    }
    if let Some(referer) = &source.referer
        && !is_http_url(referer)
    {
        return Err(malformed(format!(
            "source `{}` referer `{referer}` must be an http or https URL",
            source.slug
        )));
    }
    if let Some(path) = &source.search_path
        && (!path.starts_with('/') || path.contains(char::is_whitespace))
    {
        return Err(malformed(format!(
            "source `{}` search path `{path}` must start with '/'",
            source.slug
        )));
    }
    validate_tags(source)
}

/// Tag slugs must be non-empty and unique within their source; names non-empty.
fn validate_tags(source: &SourceManifest) -> Result<(), BusinessError> {
    let mut seen = HashSet::with_capacity(source.search.tags.len());
    for tag in &source.search.tags {
        if tag.slug.trim().is_empty() {
            return Err(malformed(format!(
                "source `{}` has a tag with an empty slug",
                source.slug
            )));
        }
        if tag.name.trim().is_empty() {
            return Err(malformed(format!(
                "tag `{}` of source `{}` has an empty name",
                tag.slug, source.slug
            )));
        }
        if !seen.insert(tag.slug.as_str()) {
            return Err(malformed(format!(
                "tag `{}` is declared more than once in source `{}`",
                tag.slug, source.slug
            )));
        }
    }
    Ok(())
}

fn validate_preset(source: &SourceManifest, preset: &PresetManifest) -> Result<(), BusinessError> {
    let label = format!("preset `{}` of source `{}`", preset.name, source.slug);
    if preset.name.trim().is_empty() {
        return Err(malformed(format!(
            "source `{}` has a preset with an empty name",
            source.slug
        )));
    }

    let request = &preset.request;
    if request.page < 1 || request.limit < 1 || request.limit > MAX_RESULTS {
        return Err(malformed(format!("{label} has an out-of-range page or limit")));
    }
    if request.query.chars().count() > MAX_QUERY_CHARS {
        return Err(malformed(format!("{label} has an over-long query")));
    }

    let capabilities = source.search.capabilities();
    if let Some(filter) = request
        .filters
        .keys()
        .find(|filter| !capabilities.allows_filter(**filter))
    {
        return Err(malformed(format!(
            "{label} uses filter `{filter}` the source does not support"
        )));
    }
    if !capabilities.allows_sort(request.sort) {
        return Err(malformed(format!(
            "{label} uses sort `{}` the source does not support",
            request.sort
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use tsundoku_core::{FilterOption, FilterValue, SearchRequest, SearchTag, SortOption};

    use super::*;
    use crate::manifest::SearchManifest;

    const HOST_URL: &str = "https://sources.example.com/manifest.json";

    fn source(slug: &str) -> SourceManifest {
        SourceManifest {
            name: format!("Source {slug}"),
            slug: slug.into(),
            icon: format!("https://cdn.example.com/{slug}.png"),
            languages: vec!["en".into()],
            url: format!("https://{slug}.example.com"),
            search: SearchManifest {
                sort: vec![SortOption::Relevance, SortOption::Latest],
                filters: vec![FilterOption::Genre],
                tags: Vec::new(),
            },
            ..SourceManifest::default()
        }
    }

    fn manifest() -> HostManifest {
        HostManifest {
            name: "Community".into(),
            author: "tsundoku".into(),
            repository: "https://github.com/tsundoku/sources".into(),
            official: false,
            sources: vec![source("alpha"), source("beta")],
        }
    }

    fn reason(err: BusinessError) -> String {
        match err {
            BusinessError::MalformedManifest { reason } => reason,
            other => panic!("expected MalformedManifest, got {other:?}"),
        }
    }

    #[test]
    fn valid_manifest_passes() {
        assert_eq!(validate(&manifest(), HOST_URL), Ok(()));
    }

    #[test]
    fn empty_name_is_rejected_first() {
        let mut m = manifest();
        m.name = "  ".into();
        m.sources.clear();
        assert!(reason(validate(&m, "ftp://x").unwrap_err()).contains("name"));
    }

    #[test]
    fn empty_author_is_rejected() {
        let mut m = manifest();
        m.author.clear();
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("author"));
    }

    #[test]
    fn duplicate_tag_slug_is_rejected() {
        let mut m = manifest();
        let tag = |slug: &str, name: &str| SearchTag {
            slug: slug.into(),
            name: name.into(),
            nsfw: false,
        };
        m.sources[0].search.tags = vec![tag("action", "Action"), tag("action", "Action!")];
        let msg = reason(validate(&m, HOST_URL).unwrap_err());
        assert!(msg.contains("tag `action`"));

        m.sources[0].search.tags = vec![tag(" ", "Blank")];
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("empty slug"));

        m.sources[0].search.tags = vec![tag("romance", "")];
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("empty name"));

        // The same slug in two different sources is fine.
        m.sources[0].search.tags = vec![tag("action", "Action")];
        m.sources[1].search.tags = vec![tag("action", "Action")];
        assert_eq!(validate(&m, HOST_URL), Ok(()));
    }

    #[test]
    fn no_sources_is_its_own_error() {
        let mut m = manifest();
        m.sources.clear();
        assert_eq!(validate(&m, HOST_URL), Err(BusinessError::NoSourcesInHost));
    }

    #[test]
    fn source_rules_precede_host_url_rule() {
        let mut m = manifest();
        m.sources[1].url = "not a url".into();
        let msg = reason(validate(&m, "file:///etc/passwd").unwrap_err());
        assert!(msg.contains("base URL"));
    }

    #[test]
    fn non_http_source_url_is_rejected() {
        let mut m = manifest();
        m.sources[0].url = "ftp://alpha.example.com".into();
        assert!(validate(&m, HOST_URL).is_err());
    }

    #[test]
    fn non_http_host_url_is_rejected() {
        let msg = reason(validate(&manifest(), "file:///tmp/manifest.json").unwrap_err());
        assert!(msg.contains("host URL"));
    }

    #[test]
    fn empty_source_name_and_slug_are_rejected() {
        let mut m = manifest();
        m.sources[0].name.clear();
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("empty name"));

        let mut m = manifest();
        m.sources[0].slug.clear();
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("empty slug"));
    }

    #[test]
    fn path_unsafe_slugs_are_rejected() {
        for slug in ["..", ".hidden", "a/b", "a b", "ünï"] {
            let mut m = manifest();
            m.sources[0].slug = slug.into();
            assert!(validate(&m, HOST_URL).is_err(), "slug {slug:?} accepted");
        }
        assert!(is_valid_slug("manga-dex_v2.1"));
    }

    #[test]
    fn duplicate_slugs_are_rejected() {
        let mut m = manifest();
        m.sources[1].slug = "alpha".into();
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("more than once"));
    }

    #[test]
    fn missing_languages_and_bad_icon_are_rejected() {
        let mut m = manifest();
        m.sources[0].languages.clear();
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("languages"));

        let mut m = manifest();
        m.sources[0].icon = "icon.png".into();
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("icon"));
    }

    #[test]
    fn search_path_must_be_absolute_path() {
        let mut m = manifest();
        m.sources[0].search_path = Some("search".into());
        assert!(validate(&m, HOST_URL).is_err());
        m.sources[0].search_path = Some("/api/search".into());
        assert!(validate(&m, HOST_URL).is_ok());
    }

    #[test]
    fn preset_outside_capabilities_is_rejected() {
        let mut m = manifest();
        m.sources[0].presets.push(PresetManifest {
            name: "Popular".into(),
            description: None,
            request: SearchRequest {
                sort: SortOption::Popularity,
                ..SearchRequest::default()
            },
        });
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("sort `popularity`"));

        let mut filters = BTreeMap::new();
        filters.insert(FilterOption::Status, FilterValue::Text("ongoing".into()));
        let mut m = manifest();
        m.sources[0].presets.push(PresetManifest {
            name: "Ongoing".into(),
            description: None,
            request: SearchRequest {
                filters,
                ..SearchRequest::default()
            },
        });
        assert!(reason(validate(&m, HOST_URL).unwrap_err()).contains("filter `status`"));
    }

    #[test]
    fn preset_inside_capabilities_passes() {
        let mut filters = BTreeMap::new();
        filters.insert(FilterOption::Genre, FilterValue::List(vec!["romance".into()]));
        let mut m = manifest();
        m.sources[0].presets.push(PresetManifest {
            name: "Romance".into(),
            description: Some("Newest romance".into()),
            request: SearchRequest {
                sort: SortOption::Latest,
                filters,
                ..SearchRequest::default()
            },
        });
        assert_eq!(validate(&m, HOST_URL), Ok(()));
    }

    fn arb_manifest() -> impl Strategy<Value = HostManifest> {
        let arb_source = (
            "[a-z]{0,6}",
            "[a-z.]{0,6}",
            prop_oneof![
                Just("https://a.example".to_string()),
                Just("ftp://a.example".to_string()),
                Just(String::new()),
            ],
            prop::collection::vec("[a-z]{2}", 0..3),
        )
            .prop_map(|(name, slug, url, languages)| SourceManifest {
                name,
                icon: format!("https://cdn.example/{slug}.png"),
                slug,
                url,
                languages,
                ..SourceManifest::default()
            });
        (
            "[a-z ]{0,8}",
            "[a-z]{0,8}",
            "[a-z:/.]{0,12}",
            prop::collection::vec(arb_source, 0..4),
        )
            .prop_map(|(name, author, repository, sources)| HostManifest {
                name,
                author,
                repository,
                official: false,
                sources,
            })
    }

    proptest! {
        #[test]
        fn validation_is_pure(m in arb_manifest(), https in any::<bool>()) {
            let host_url = if https { HOST_URL } else { "gopher://x" };
            let before = m.clone();
            let first = validate(&m, host_url);
            let second = validate(&m, host_url);
            prop_assert_eq!(first, second);
            prop_assert_eq!(m, before);
        }
    }
}
