use chrono::{DateTime, TimeZone, Utc};
use litedoc::collection::{Document, DocumentCollection};
use litedoc::doc;
use litedoc::errors::LiteDocResult;
use litedoc::Database;
use std::backtrace::Backtrace;
use std::thread;
use std::time::{Duration, Instant};

/// Runs `test` between `before` and `after`, retrying a failed attempt.
/// `after` runs even when the test body fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> LiteDocResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> LiteDocResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> LiteDocResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 2;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| format!("After run failed: {:?}\n{}", e, backtrace)),
                    Err(e) => {
                        let _ = after(ctx);
                        Err(format!("Test failed: {:?}\n{}", e, backtrace))
                    }
                },
                Err(e) => Err(format!("Before run failed: {:?}", e)),
            }
        });

        let error = match result {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => e,
            Err(panic_err) => {
                if let Some(s) = panic_err.downcast_ref::<&str>() {
                    format!("Panic: {}", s)
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    format!("Panic: {}", s)
                } else {
                    "Panic: unknown payload".to_string()
                }
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "Test attempt {}/{} failed after {:?}: {}",
                attempt,
                MAX_RETRIES,
                start_time.elapsed(),
                error
            );
            thread::sleep(Duration::from_millis(50));
        }
        last_error = Some(error);
    }

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    db: Database,
    collection_name: String,
}

impl TestContext {
    pub fn new(db: Database, collection_name: String) -> Self {
        Self { db, collection_name }
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }

    /// The collection reserved for this test run.
    pub fn posts(&self) -> LiteDocResult<DocumentCollection> {
        self.db.collection(&self.collection_name)
    }
}

pub fn random_name() -> String {
    format!("posts_{}", uuid::Uuid::new_v4().simple())
}

pub fn create_test_context() -> LiteDocResult<TestContext> {
    let db = Database::builder().open()?;
    Ok(TestContext::new(db, random_name()))
}

pub fn cleanup(ctx: TestContext) -> LiteDocResult<()> {
    if ctx.db().is_closed() {
        return Ok(());
    }
    ctx.db().close()
}

pub fn post_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, day, 12, 0, 0).unwrap()
}

/// The four blog posts used throughout the scenario tests.
pub fn create_post_docs() -> Vec<Document> {
    vec![
        doc! {
            title: "Post One",
            body: "Body of post one",
            category: "News",
            likes: 4,
            tags: ["news", "events"],
            user: { name: "John Doe", status: "author" },
            date: (post_date(1)),
        },
        doc! {
            title: "Post Two",
            body: "Body of post two",
            category: "Technology",
            date: (post_date(2)),
        },
        doc! {
            title: "Post Three",
            body: "Body of post three",
            category: "News",
            date: (post_date(3)),
        },
        doc! {
            title: "Post Four",
            body: "Body of post four",
            category: "Entertainment",
            date: (post_date(4)),
        },
    ]
}

pub fn insert_posts(collection: &DocumentCollection) -> LiteDocResult<()> {
    collection.insert_many(create_post_docs())?;
    Ok(())
}

/// Titles of `documents`, in order.
pub fn titles(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| doc.get("title"))
        .filter_map(|title| title.as_str().map(str::to_string))
        .collect()
}
