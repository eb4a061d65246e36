use deckstyle_core::types::set_category;
use deckstyle_core::{ExemplarScope, ExtractedDesign, NewExemplar};
use deckstyle_store::{ExemplarStore, SqliteExemplarStore};

fn exemplar(category: &str, keywords: &[&str]) -> NewExemplar {
    NewExemplar {
        category_tag: category.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        extracted_spec: Some(ExtractedDesign::fallback(vec!["clean".to_string()], 82)),
        quality_score: Some(82),
        uploaded_by: Some("tutor-7".to_string()),
        image_ref: Some("https://example.com/deck.png".to_string()),
    }
}

#[test]
fn test_exemplars_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exemplars.db");

    let id = {
        let store = SqliteExemplarStore::open(&path).unwrap();
        let stored = store.insert(exemplar(&set_category("brand"), &["Modern"])).unwrap();
        store.increment_usage(&stored.id).unwrap();
        stored.id
    };

    let store = SqliteExemplarStore::open(&path).unwrap();
    let fetched = store.get(&id).unwrap().unwrap();
    assert_eq!(fetched.keywords, vec!["modern"]);
    assert_eq!(fetched.usage_count, 1);
    assert_eq!(fetched.uploaded_by.as_deref(), Some("tutor-7"));
    assert_eq!(fetched.set_id(), Some("brand"));
    assert_eq!(
        fetched.extracted_spec.unwrap().style_keywords,
        vec!["clean".to_string()]
    );
}

#[test]
fn test_reopen_runs_migrations_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exemplars.db");

    SqliteExemplarStore::open(&path).unwrap();
    let store = SqliteExemplarStore::open(&path).unwrap();
    store.insert(exemplar("general", &["tech"])).unwrap();

    let all = store.candidates(&ExemplarScope::default(), 10).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_store_is_shareable_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(SqliteExemplarStore::open(&dir.path().join("x.db")).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || {
                let keyword = format!("kw{}", i);
                store.insert(exemplar("general", &[keyword.as_str()])).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count().unwrap(), 4);
}
