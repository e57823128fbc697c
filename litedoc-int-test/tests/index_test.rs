use litedoc::collection::{DocumentCollection, ScanStage, UpdateSpec};
use litedoc::doc;
use litedoc::errors::{ErrorKind, LiteDocResult};
use litedoc::filter::{all, field};
use litedoc::index::{non_unique_index, unique_index, IndexOptions};
use litedoc_int_test::test_util::{cleanup, create_test_context, insert_posts, run_test};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn index_names(posts: &DocumentCollection) -> Vec<String> {
    posts.list_indexes().iter().map(|index| index.name()).collect()
}

/// Checks that every indexed query returns what a full scan returns.
fn assert_index_consistent(posts: &DocumentCollection, field_name: &str) -> LiteDocResult<()> {
    let all_docs: Vec<_> = posts.find(all())?.collect::<LiteDocResult<_>>()?;
    for doc in &all_docs {
        let value = doc.get_value(field_name);
        if value.is_null() {
            continue;
        }
        let expected = all_docs
            .iter()
            .filter(|other| other.get_value(field_name) == value)
            .count();
        assert_eq!(posts.count(field(field_name).eq(value.clone()))?, expected);
    }
    Ok(())
}

#[test]
fn test_default_id_index() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            assert_eq!(index_names(&posts), vec!["_id_"]);

            let indexes = posts.get_indexes();
            assert_eq!(indexes.len(), 1);
            assert_eq!(indexes[0].get("name").unwrap().as_str(), Some("_id_"));
            assert_eq!(indexes[0].get("key._id").unwrap().as_i64(), Some(1));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explain_before_and_after_index() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;

            let before = posts.explain(field("title").eq("Post One"))?;
            assert_eq!(before.stage(), ScanStage::CollectionScan);
            assert!(before.used_index().is_none());
            assert_eq!(before.scanned_docs(), 4);
            assert_eq!(before.matched_docs(), 1);

            posts.create_index(vec!["title"], &unique_index().with_drop_dups(true))?;

            let after = posts.explain(field("title").eq("Post One"))?;
            assert_eq!(after.stage(), ScanStage::IndexScan);
            assert_eq!(after.used_index(), Some("title_1"));
            assert_eq!(after.scanned_docs(), 1);
            assert_eq!(after.matched_docs(), 1);

            let report = after.to_document();
            assert_eq!(report.get("stage").unwrap().as_str(), Some("IXSCAN"));
            assert_eq!(report.get("nReturned").unwrap().as_i64(), Some(1));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_rejects_duplicates() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;
            posts.create_index(vec!["title"], &unique_index())?;

            let err = posts.insert(doc! { title: "Post One" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert!(err.message().contains("title_1"));
            assert_eq!(posts.size()?, 4);
            assert_index_consistent(&posts, "title")?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_build() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;
            posts.insert(doc! { title: "Post One", body: "a late duplicate" })?;

            let err = posts.create_index(vec!["title"], &unique_index()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(index_names(&posts), vec!["_id_"]);
            assert_eq!(posts.size()?, 5);

            // dropDups keeps the first document in _id order
            posts.create_index(vec!["title"], &unique_index().with_drop_dups(true))?;
            assert_eq!(posts.size()?, 4);
            let survivor = posts.find_one(field("title").eq("Post One"))?;
            assert_eq!(survivor.get("body").unwrap().as_str(), Some("Body of post one"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_identity() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            let first = posts.create_index(vec!["category"], &non_unique_index())?;
            let again = posts.create_index(vec!["category"], &non_unique_index())?;
            assert_eq!(first, again);
            assert_eq!(posts.list_indexes().len(), 2);

            let err = posts.create_index(vec!["category"], &unique_index()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexingError);

            let err = posts.create_index(vec!["category"], &IndexOptions::new("spatial")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexingError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_nested_and_compound_indexes() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;

            let nested = posts.create_index_from(
                &doc! { "user.name": 1 },
                &non_unique_index().with_background(true),
            )?;
            assert!(nested.background());
            assert!(posts.has_index(vec!["user.name"])?);
            assert_eq!(
                posts.explain(field("user.name").eq("John Doe"))?.used_index(),
                Some("user.name_1")
            );

            let mut keys = litedoc::collection::Document::new();
            keys.put_raw("category", 1);
            keys.put_raw("date", -1);
            let compound = posts.create_index_from(&keys, &non_unique_index())?;
            assert!(compound.is_compound_index());
            assert_eq!(compound.name(), "category_1_date_-1");

            let explain = posts.explain(field("category").eq("News").and(field("title").eq("Post Three")))?;
            assert_eq!(explain.stage(), ScanStage::IndexScan);
            assert_eq!(explain.matched_docs(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_follows_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;
            posts.create_index(vec!["category"], &non_unique_index())?;

            posts.insert(doc! { title: "Post Five", category: "News" })?;
            posts.update(
                field("title").eq("Post Two"),
                UpdateSpec::operators().set("category", "News"),
            )?;
            posts.update(
                field("title").eq("Post One"),
                UpdateSpec::operators().rename("category", "section"),
            )?;
            posts.remove(field("title").eq("Post Three"))?;

            let news: Vec<_> = posts
                .find(field("category").eq("News"))?
                .collect::<LiteDocResult<_>>()?;
            assert_eq!(news.len(), 2);
            assert_index_consistent(&posts, "category")?;
            assert_eq!(posts.count(field("category").eq("Technology"))?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_array_values_are_indexed_per_element() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;
            posts.create_index(vec!["tags"], &non_unique_index())?;

            let explain = posts.explain(field("tags").eq("events"))?;
            assert_eq!(explain.stage(), ScanStage::IndexScan);
            assert_eq!(explain.matched_docs(), 1);
            assert_eq!(posts.count(field("tags").in_array(vec!["news", "sports"]))?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_range_query_on_index() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            for views in [1, 3, 5, 7, 9] {
                posts.insert(doc! { views: views })?;
            }
            posts.create_index(vec!["views"], &non_unique_index())?;

            let explain = posts.explain(field("views").gt(3).and(field("views").lte(7)))?;
            assert_eq!(explain.stage(), ScanStage::IndexScan);
            assert_eq!(explain.matched_docs(), 2);
            assert_eq!(posts.count(field("views").gte(5))?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_drop_indexes() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;
            posts.create_index(vec!["title"], &unique_index())?;
            posts.create_index(vec!["category"], &non_unique_index())?;
            assert_eq!(index_names(&posts), vec!["_id_", "category_1", "title_1"]);

            posts.drop_index(vec!["title"])?;
            assert!(!posts.has_index(vec!["title"])?);
            // the unique constraint went with the index
            posts.insert(doc! { title: "Post One" })?;

            let err = posts.drop_index(vec!["title"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            let err = posts.drop_index(vec!["_id"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            posts.drop_all_indexes();
            assert_eq!(index_names(&posts), vec!["_id_"]);
            assert_eq!(posts.count(field("category").eq("News"))?, 2);
            Ok(())
        },
        cleanup,
    )
}
