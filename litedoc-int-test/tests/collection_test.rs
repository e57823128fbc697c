use litedoc::collection::{Document, ObjectId};
use litedoc::doc;
use litedoc::errors::ErrorKind;
use litedoc::filter::{all, by_id, field};
use litedoc::Database;
use litedoc_int_test::test_util::{
    cleanup, create_post_docs, create_test_context, insert_posts, run_test,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_create_and_list_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.create_collection("posts")?;
            db.create_collection("comments")?;
            assert_eq!(db.list_collection_names()?, vec!["comments", "posts"]);
            assert!(db.has_collection("posts")?);

            let err = db.create_collection("posts").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_auto_create_disabled() {
    let db = Database::builder()
        .auto_create_collections(false)
        .open()
        .unwrap();
    let err = db.collection("posts").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NotFound);

    let posts = db.create_collection("posts").unwrap();
    posts.insert(doc! { title: "Post One" }).unwrap();
    assert_eq!(db.collection("posts").unwrap().size().unwrap(), 1);
    db.close().unwrap();
}

#[test]
fn test_insert_and_get_by_id() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            let original = create_post_docs().remove(0);
            let result = posts.insert(original.clone())?;
            assert_eq!(result.inserted_count(), 1);

            let id = result.inserted_ids()[0];
            let stored = posts.get_by_id(&id)?;
            assert_eq!(stored.id(), Some(id));
            for (key, value) in original.iter() {
                assert_eq!(stored.get(key).as_ref(), Some(value));
            }
            assert_eq!(stored.size(), original.size() + 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_keeps_given_id() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            let id = ObjectId::new();
            let mut post = doc! { title: "Post One" };
            post.put("_id", id)?;

            let result = posts.insert(post.clone())?;
            assert_eq!(result.inserted_ids(), &[id]);

            let err = posts.insert(post).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(posts.size()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_documents_are_copies() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            let mut post = doc! { title: "Post One" };
            let id = posts.insert(post.clone())?.inserted_ids()[0];

            post.put("title", "changed locally")?;
            let mut fetched = posts.get_by_id(&id)?;
            fetched.put("title", "changed again")?;

            let stored = posts.get_by_id(&id)?;
            assert_eq!(stored.get("title").unwrap().as_str(), Some("Post One"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            let result = posts.insert_many(create_post_docs())?;
            assert_eq!(result.inserted_count(), 4);
            assert_eq!(posts.size()?, 4);

            let ids: Vec<ObjectId> = result.into_iter().collect();
            let mut sorted = ids.clone();
            sorted.sort();
            assert_eq!(ids, sorted, "ids are generated in creation order");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_stops_at_first_failure() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            let id = ObjectId::new();
            let mut first = doc! { title: "first" };
            first.put("_id", id)?;
            let mut duplicate = doc! { title: "duplicate" };
            duplicate.put("_id", id)?;

            let batch: Vec<Document> = vec![first, duplicate, doc! { title: "never" }];
            let err = posts.insert_many(batch).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(posts.size()?, 1);
            assert_eq!(posts.count(field("title").eq("never"))?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_missing_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;

            let post = posts.find_one(field("category").eq("Technology"))?;
            assert_eq!(post.get("title").unwrap().as_str(), Some("Post Two"));

            let err = posts.find_one(field("category").eq("Sports")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);

            let err = posts.get_by_id(&ObjectId::new()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove() {
    run_test(
        create_test_context,
        |ctx| {
            let posts = ctx.posts()?;
            insert_posts(&posts)?;

            let result = posts.remove_one(field("category").eq("News"))?;
            assert_eq!(result.deleted(), 1);
            assert_eq!(posts.count(field("category").eq("News"))?, 1);

            let result = posts.remove(field("category").eq("Sports"))?;
            assert_eq!(result.deleted(), 0);

            let id = posts.find_one(field("title").eq("Post Two"))?.id().unwrap();
            assert_eq!(posts.remove(by_id(id))?.deleted(), 1);
            assert!(posts.get_by_id(&id).is_err());

            assert_eq!(posts.remove(all())?.deleted(), 2);
            assert_eq!(posts.size()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_drop_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let posts = db.collection("posts")?;
            insert_posts(&posts)?;

            db.drop_collection("posts")?;
            assert!(posts.is_dropped());
            assert_eq!(posts.size().unwrap_err().kind(), &ErrorKind::NotFound);
            assert_eq!(
                posts.insert(doc! { title: "late" }).unwrap_err().kind(),
                &ErrorKind::NotFound
            );

            let err = db.drop_collection("posts").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_closed_database() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let posts = ctx.posts()?;
            insert_posts(&posts)?;
            db.close()?;

            assert!(db.is_closed());
            assert!(posts.is_dropped());
            let err = db.collection("posts").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        cleanup,
    )
}
