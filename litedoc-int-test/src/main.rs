use litedoc::collection::{order_by, UpdateSpec};
use litedoc::common::SortOrder;
use litedoc::doc;
use litedoc::errors::LiteDocResult;
use litedoc::filter::{all, field};
use litedoc::index::non_unique_index;
use litedoc_int_test::test_util::{cleanup, create_test_context};

fn main() -> LiteDocResult<()> {
    colog::init();
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let posts = ctx.posts()?;
    posts.create_index(vec!["processed"], &non_unique_index())?;

    let count = 100_000;
    let start = std::time::Instant::now();
    for i in 0..count {
        posts.insert(doc! {
            title: (uuid::Uuid::new_v4().to_string()),
            seq: (i as i64),
            processed: false,
        })?;
    }
    println!("Inserted {} documents in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut cursor = posts.find_with_options(all(), &order_by("title", SortOrder::Ascending))?;
    let sorted = cursor.size()?;
    println!("Sorted {} documents in {:?}", sorted, start.elapsed());

    let start = std::time::Instant::now();
    let result = posts.update(
        field("processed").eq(false),
        UpdateSpec::operators().set("processed", true),
    )?;
    println!("Updated {} documents in {:?}", result.modified(), start.elapsed());

    let start = std::time::Instant::now();
    let processed = posts.count(field("processed").eq(true))?;
    println!("Counted {} processed documents in {:?}", processed, start.elapsed());

    cleanup(ctx)
}
