// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the registry store.

use std::collections::{BTreeMap, BTreeSet};

use tsundoku_core::{
    AuthDeclaration, AuthType, FilterOption, FilterValue, HostId, SearchCapabilities,
    SearchRequest, SearchTag, SortOption, SourceId,
};
use tsundoku_storage::queries::{hosts, search, snapshot, sources};
use tsundoku_storage::{Database, InsertOutcome, NewHost, NewPreset, NewSource};

fn new_source(slug: &str, name: &str) -> NewSource {
    let mut filters = BTreeMap::new();
    filters.insert(FilterOption::Genre, FilterValue::List(vec!["action".into()]));
    let request = SearchRequest {
        sort: SortOption::Popularity,
        filters,
        ..SearchRequest::new("")
    };
    NewSource {
        slug: slug.into(),
        name: name.into(),
        icon: format!("{slug}.png"),
        icon_url: format!("https://cdn.example.com/{slug}.png"),
        url: format!("https://{slug}.example.com"),
        referer: None,
        search_path: "/search".into(),
        languages: vec!["en".into()],
        nsfw: false,
        auth: AuthDeclaration::default(),
        capabilities: SearchCapabilities {
            supported_sorts: BTreeSet::from([SortOption::Relevance, SortOption::Popularity]),
            supported_filters: BTreeSet::from([FilterOption::Genre]),
            tags: vec![SearchTag {
                slug: "action".into(),
                name: "Action".into(),
                nsfw: false,
            }],
        },
        presets: vec![NewPreset {
            name: "Popular action".into(),
            description: Some("Most followed action titles".into()),
            request_blob: request.to_blob().unwrap(),
        }],
    }
}

fn new_host(repository: &str, sources: Vec<NewSource>) -> NewHost {
    NewHost {
        name: "Community Sources".into(),
        author: "tsundoku".into(),
        url: format!("{repository}/manifest.json"),
        repository: repository.into(),
        official: false,
        asset_key: format!("key-{}", repository.len()),
        sources,
    }
}

async fn insert(db: &Database, host: NewHost) -> HostId {
    match hosts::insert_host(db, host).await.unwrap() {
        InsertOutcome::Inserted(id) => id,
        InsertOutcome::Duplicate => panic!("unexpected duplicate"),
    }
}

#[tokio::test]
async fn insert_and_snapshot_round_trip() {
    let db = Database::open_in_memory().await.unwrap();
    let id = insert(
        &db,
        new_host(
            "https://github.com/tsundoku/sources",
            vec![new_source("mangadex", "MangaDex"), new_source("comick", "ComicK")],
        ),
    )
    .await;

    let snap = snapshot::load_snapshot(&db).await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].host.id, id);
    assert_eq!(snap[0].sources.len(), 2);
    // Sorted by name when nothing is pinned.
    assert_eq!(snap[0].sources[0].source.slug, "comick");

    let source = &snap[0].sources[1];
    assert_eq!(source.source.languages, vec!["en".to_string()]);
    assert!(source.capabilities.allows_sort(SortOption::Popularity));
    assert!(source.capabilities.allows_filter(FilterOption::Genre));
    assert_eq!(source.capabilities.tags.len(), 1);
    assert_eq!(source.presets.len(), 1);
    assert_eq!(source.presets[0].request.sort, SortOption::Popularity);
}

#[tokio::test]
async fn duplicate_repository_reports_duplicate_and_keeps_first() {
    let db = Database::open_in_memory().await.unwrap();
    let repo = "https://github.com/tsundoku/sources";
    insert(&db, new_host(repo, vec![new_source("a", "A")])).await;

    let mut second = new_host(repo, vec![new_source("b", "B")]);
    second.asset_key = "other-key".into();
    let outcome = hosts::insert_host(&db, second).await.unwrap();
    assert_eq!(outcome, InsertOutcome::Duplicate);

    let snap = snapshot::load_snapshot(&db).await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].sources.len(), 1);
    assert_eq!(snap[0].sources[0].source.slug, "a");
}

#[tokio::test]
async fn failed_source_insert_rolls_back_host() {
    let db = Database::open_in_memory().await.unwrap();
    // Duplicate slugs inside one host violate UNIQUE(host_id, slug).
    let host = new_host(
        "https://github.com/tsundoku/broken",
        vec![new_source("same", "One"), new_source("same", "Two")],
    );
    let err = hosts::insert_host(&db, host).await.unwrap_err();
    assert!(!err.is_recoverable());

    assert!(hosts::list_hosts(&db).await.unwrap().is_empty());
    assert_eq!(db.version(), 0);
}

#[tokio::test]
async fn delete_host_cascades_to_sources() {
    let db = Database::open_in_memory().await.unwrap();
    let id = insert(
        &db,
        new_host("https://github.com/tsundoku/sources", vec![new_source("a", "A")]),
    )
    .await;
    let source_id = sources::list_for_host(&db, id).await.unwrap()[0].id;

    assert!(hosts::delete_host(&db, id).await.unwrap());
    assert!(!hosts::delete_host(&db, id).await.unwrap());
    assert!(sources::get_source(&db, source_id).await.unwrap().is_none());
    assert!(search::get_capabilities(&db, source_id).await.unwrap().is_none());
    assert!(search::list_presets(&db, source_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn pinned_sources_sort_first() {
    let db = Database::open_in_memory().await.unwrap();
    let id = insert(
        &db,
        new_host(
            "https://github.com/tsundoku/sources",
            vec![new_source("alpha", "Alpha"), new_source("zeta", "Zeta")],
        ),
    )
    .await;
    let zeta = sources::list_for_host(&db, id)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.slug == "zeta")
        .unwrap();

    assert!(sources::set_pinned(&db, zeta.id, true).await.unwrap());
    let listed = sources::list_for_host(&db, id).await.unwrap();
    assert_eq!(listed[0].slug, "zeta");
    assert!(listed[0].pinned);
}

#[tokio::test]
async fn set_flag_on_missing_source_returns_false() {
    let db = Database::open_in_memory().await.unwrap();
    assert!(!sources::set_disabled(&db, SourceId(42), true).await.unwrap());
    assert_eq!(db.version(), 0);
}

#[tokio::test]
async fn writes_bump_change_version() {
    let db = Database::open_in_memory().await.unwrap();
    let id = insert(
        &db,
        new_host("https://github.com/tsundoku/sources", vec![new_source("a", "A")]),
    )
    .await;
    assert_eq!(db.version(), 1);

    let source_id = sources::list_for_host(&db, id).await.unwrap()[0].id;
    sources::set_disabled(&db, source_id, true).await.unwrap();
    assert_eq!(db.version(), 2);
    assert!(sources::get_source(&db, source_id).await.unwrap().unwrap().disabled);

    hosts::delete_host(&db, id).await.unwrap();
    assert_eq!(db.version(), 3);
}

#[tokio::test]
async fn auth_declaration_survives_storage() {
    let db = Database::open_in_memory().await.unwrap();
    let mut source = new_source("private", "Private");
    source.auth = AuthDeclaration {
        kind: AuthType::ApiKey,
        required: true,
    };
    source.referer = Some("https://private.example.com/".into());
    let id = insert(&db, new_host("https://github.com/tsundoku/private", vec![source])).await;

    let stored = &sources::list_for_host(&db, id).await.unwrap()[0];
    assert_eq!(stored.auth.kind, AuthType::ApiKey);
    assert!(stored.auth.required);
    assert_eq!(stored.referer.as_deref(), Some("https://private.example.com/"));
}

#[tokio::test]
async fn lookups_by_url_and_repository() {
    let db = Database::open_in_memory().await.unwrap();
    let repo = "https://github.com/tsundoku/sources";
    let id = insert(&db, new_host(repo, vec![new_source("a", "A")])).await;

    let by_repo = hosts::find_by_repository(&db, repo).await.unwrap().unwrap();
    assert_eq!(by_repo.id, id);
    let by_url = hosts::find_by_url(&db, &format!("{repo}/manifest.json"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_url.id, id);
    assert!(hosts::get_host(&db, HostId(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn preset_lookup_by_id() {
    let db = Database::open_in_memory().await.unwrap();
    let id = insert(
        &db,
        new_host("https://github.com/tsundoku/sources", vec![new_source("a", "A")]),
    )
    .await;
    let source_id = sources::list_for_host(&db, id).await.unwrap()[0].id;
    let presets = search::list_presets(&db, source_id).await.unwrap();
    let preset = search::get_preset(&db, presets[0].id).await.unwrap().unwrap();
    assert_eq!(preset.name, "Popular action");
    assert_eq!(preset.source_id, source_id);
    assert!(search::get_preset(&db, 9999).await.unwrap().is_none());
}
