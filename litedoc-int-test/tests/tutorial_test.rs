//! The blog-posts walkthrough: create, query, page, update, index and
//! search a `posts` collection end to end.

use litedoc::collection::{order_by, projection, upsert, Document, ObjectId, UpdateSpec};
use litedoc::common::SortOrder;
use litedoc::doc;
use litedoc::errors::LiteDocResult;
use litedoc::filter::{all, by_id, field, parse_filter, text};
use litedoc::index::{non_unique_index, unique_index};
use litedoc_int_test::test_util::{cleanup, create_post_docs, create_test_context, run_test, titles};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn collect(cursor: litedoc::common::stream::DocumentCursor) -> LiteDocResult<Vec<Document>> {
    cursor.collect()
}

#[test]
fn test_blog_posts_walkthrough() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let posts = db.create_collection("posts")?;

            let mut docs = create_post_docs();
            posts.insert(docs.remove(0))?;
            posts.insert_many(docs)?;

            // query, sort and count
            assert_eq!(collect(posts.find(all())?)?.len(), 4);
            assert_eq!(posts.find(field("category").eq("News"))?.size()?, 2);
            let newest_first = collect(
                posts.find_with_options(all(), &order_by("title", SortOrder::Descending).limit(5))?,
            )?;
            assert_eq!(newest_first.len(), 4);
            assert_eq!(titles(&newest_first)[0], "Post Two");

            // both paging styles agree
            let page_size = 2;
            let skip_pages: Vec<String> = (0..2)
                .flat_map(|n| {
                    let options = order_by("_id", SortOrder::Ascending)
                        .skip(n * page_size)
                        .limit(page_size);
                    titles(&collect(posts.find_with_options(all(), &options).unwrap()).unwrap())
                })
                .collect();
            let first_page = collect(posts.find_with_options(
                all(),
                &order_by("_id", SortOrder::Ascending).limit(page_size),
            )?)?;
            let last_id = first_page.last().and_then(|doc| doc.id()).unwrap();
            let second_page = collect(posts.find_with_options(
                field("_id").gt(last_id),
                &order_by("_id", SortOrder::Ascending).limit(page_size),
            )?)?;
            let mut keyset_pages = titles(&first_page);
            keyset_pages.extend(titles(&second_page));
            assert_eq!(skip_pages, keyset_pages);

            let mut printed = Vec::new();
            for post in posts.find(all())? {
                printed.push(format!("Blog Post: {}", post?.get_value("title")));
            }
            assert_eq!(printed.len(), 4);

            // findOne and projections
            let news = posts.find_one(field("category").eq("News"))?;
            let id = news.id().unwrap();
            let only_title =
                posts.find_one_with_options(by_id(id), &projection(doc! { title: 1 }))?;
            assert_eq!(only_title.size(), 2);
            let without_title =
                posts.find_one_with_options(by_id(id), &projection(doc! { title: 0 }))?;
            assert!(without_title.get("title").is_none());

            // replace with upsert, then operators
            let two = posts.find_one(field("title").eq("Post Two"))?.id().unwrap();
            posts.update_with_options(
                by_id(two),
                UpdateSpec::replace(doc! { title: "Post Two", body: "New post 2 body" }),
                &upsert(),
            )?;
            posts.update(
                by_id(two),
                UpdateSpec::parse(&doc! {
                    "$set": { body: "Body of post 2", category: "Technology" }
                })?,
            )?;
            posts.update(by_id(id), UpdateSpec::parse(&doc! { "$inc": { likes: 2 } })?)?;
            posts.update(by_id(id), UpdateSpec::parse(&doc! { "$rename": { likes: "views" } })?)?;
            assert_eq!(posts.get_by_id(&id)?.get("views").unwrap().as_i64(), Some(6));

            let missing = ObjectId::new();
            let result = posts.update_with_options(
                by_id(missing),
                UpdateSpec::replace(doc! { title: "Post Five" }),
                &upsert(),
            )?;
            assert_eq!(result.upserted_id(), Some(missing));
            assert_eq!(posts.remove(by_id(missing))?.deleted(), 1);

            // embedded comments
            posts.update(
                by_id(id),
                UpdateSpec::parse(&doc! {
                    "$set": {
                        comments: [
                            { user: "Mary Williams", body: "Comment One" },
                            { user: "Harry White", body: "Comment Two" }
                        ]
                    }
                })?,
            )?;
            let commented = posts.find_one(
                field("comments").elem_match(field("user").eq("Mary Williams")),
            )?;
            assert_eq!(commented.id(), Some(id));

            // text search
            posts.create_index_from(&doc! { title: "text" }, &non_unique_index())?;
            let mut found = titles(&collect(posts.find(text("\"Post T\""))?)?);
            found.sort();
            assert_eq!(found, vec!["Post Three", "Post Two"]);

            // comparison and combined queries
            assert_eq!(posts.count(field("views").gt(3))?, 1);
            posts.update(
                field("title").eq("Post Three"),
                UpdateSpec::operators().set("views", 5),
            )?;
            let query = parse_filter(&doc! { title: { "$regex": "^Post T" }, views: { "$lte": 6 } })?;
            let found = collect(posts.find_with_options(
                query,
                &projection(doc! { title: 1, views: 1 }),
            )?)?;
            assert_eq!(titles(&found), vec!["Post Three"]);
            assert_eq!(found[0].size(), 3);

            let early = posts.count(field("date").lte(litedoc_int_test::test_util::post_date(2)))?;
            // the replaced Post Two lost its date
            assert_eq!(early, 1);

            // indexes and explain; a field set carries a single index
            assert_eq!(posts.get_indexes().len(), 2);
            posts.drop_index(vec!["title"])?;
            let before = posts.explain(field("title").eq("Post One"))?;
            assert_eq!(before.scanned_docs(), 4);
            posts.create_index(vec!["title"], &unique_index().with_drop_dups(true))?;
            let after = posts.explain(field("title").eq("Post One"))?;
            assert_eq!(after.used_index(), Some("title_1"));
            assert_eq!(after.scanned_docs(), 1);

            posts.create_index_from(
                &doc! { "components.area": 1 },
                &non_unique_index().with_background(true),
            )?;
            assert_eq!(posts.get_indexes().len(), 3);

            // delete
            assert_eq!(posts.remove(by_id(id))?.deleted(), 1);
            assert_eq!(posts.size()?, 3);
            Ok(())
        },
        cleanup,
    )
}
