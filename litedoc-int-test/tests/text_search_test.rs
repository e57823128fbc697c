use litedoc::collection::{DocumentCollection, ScanStage, UpdateSpec};
use litedoc::doc;
use litedoc::errors::{ErrorKind, LiteDocResult};
use litedoc::filter::{field, parse_filter, text};
use litedoc::index::{non_unique_index, text_index};
use litedoc_int_test::test_util::{cleanup, create_test_context, random_name, run_test, titles};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn search(posts: &DocumentCollection, query: &str) -> LiteDocResult<Vec<String>> {
    let docs: Vec<_> = posts.find(text(query))?.collect::<LiteDocResult<_>>()?;
    let mut found = titles(&docs);
    found.sort();
    Ok(found)
}

#[test]
fn test_phrase_prefix_search() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.insert(doc! { title: "Post Two" })?;
            posts.insert(doc! { title: "Post Three" })?;
            posts.create_index_from(&doc! { title: "text" }, &non_unique_index())?;

            assert_eq!(search(&posts, "\"Post T\"")?, vec!["Post Three", "Post Two"]);
            assert!(search(&posts, "\"Post One\"")?.is_empty());
            assert_eq!(search(&posts, "\"post tw\"")?, vec!["Post Two"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_text_filter_reused_across_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.create_index(vec!["title"], &text_index())?;
            posts.insert(doc! { title: "Rust news", body: "nothing here" })?;

            let comments = ctx.db().collection(&random_name())?;
            comments.create_index(vec!["body"], &text_index())?;
            comments.insert(doc! { title: "Comment One", body: "more rust news" })?;

            let filter = text("rust");
            let found = posts.find(filter.clone())?.collect::<LiteDocResult<Vec<_>>>()?;
            assert_eq!(titles(&found), vec!["Rust news"]);
            let found = comments.find(filter.clone())?.collect::<LiteDocResult<Vec<_>>>()?;
            assert_eq!(titles(&found), vec!["Comment One"]);
            assert_eq!(comments.explain(filter)?.used_index(), Some("body_text"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_term_search() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.create_index(vec!["body"], &text_index())?;
            posts.insert(doc! { title: "Post One", body: "a quick brown fox jumps over the lazy dog" })?;
            posts.insert(doc! { title: "Post Two", body: "quick hello world from litedoc" })?;
            posts.insert(doc! { title: "Post Three", body: "the fox is QUICK" })?;

            assert_eq!(search(&posts, "quick")?, vec!["Post One", "Post Three", "Post Two"]);
            assert_eq!(search(&posts, "quick fox")?, vec!["Post One", "Post Three"]);
            assert_eq!(search(&posts, "Fox LAZY")?, vec!["Post One"]);
            assert!(search(&posts, "cat")?.is_empty());
            // partial words do not match outside phrases
            assert!(search(&posts, "qui")?.is_empty());

            let explain = posts.explain(text("hello"))?;
            assert_eq!(explain.stage(), ScanStage::TextScan);
            assert_eq!(explain.used_index(), Some("body_text"));
            assert_eq!(explain.matched_docs(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_text_query_document() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.create_index(vec!["title"], &text_index())?;
            posts.insert(doc! { title: "Post Two", category: "Technology" })?;
            posts.insert(doc! { title: "Post Three", category: "News" })?;

            let filter = parse_filter(&doc! {
                "$text": { "$search": "\"Post T\"" },
                category: "News",
            })?;
            let found: Vec<_> = posts.find(filter)?.collect::<LiteDocResult<_>>()?;
            assert_eq!(titles(&found), vec!["Post Three"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_text_index_follows_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.insert(doc! { title: "Post Two" })?;
            posts.insert(doc! { title: "Post Three" })?;
            posts.create_index(vec!["title"], &text_index())?;

            posts.update(
                field("title").eq("Post Two"),
                UpdateSpec::operators().set("title", "Article Two"),
            )?;
            posts.insert(doc! { title: "Post Tango" })?;
            posts.remove(field("title").eq("Post Three"))?;

            assert_eq!(search(&posts, "\"Post T\"")?, vec!["Post Tango"]);
            assert_eq!(search(&posts, "article")?, vec!["Article Two"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_text_search_requires_index() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.insert(doc! { title: "Post Two" })?;

            let err = posts.find(text("post")).err().map(|e| e.kind().clone());
            assert_eq!(err, Some(ErrorKind::IndexMissing));

            posts.create_index(vec!["title"], &text_index())?;
            let err = posts.find(field("body").text("post")).err().map(|e| e.kind().clone());
            assert_eq!(err, Some(ErrorKind::IndexMissing));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_one_text_index_per_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            posts.create_index(vec!["title"], &text_index())?;
            let err = posts.create_index(vec!["body"], &text_index()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexingError);

            let err = posts
                .create_index_from(&doc! { title: "text", likes: 1 }, &non_unique_index())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            Ok(())
        },
        cleanup,
    )
}
