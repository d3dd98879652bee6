//! Database integration tests with DuckDB
//!
//! Every strategy is run against an on-disk DuckDB table, including
//! timestamp ties and sub-second creation times.

use duckdb::Connection;
use pagewise::cli::{open_store, router, ServerConfig};
use pagewise::config::{StoreKind, StoreSettings};
use pagewise::database::{DuckDbStore, RecordStore};
use pagewise::pagination::{
    CursorPaginator, CursorQuery, OffsetPaginator, OffsetQuery, ParamDecoder, Paginator,
    RequestContext, SeekPaginator, SeekQuery, TokenPaginator, TokenQuery,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use test_case::test_case;

const CREATE_TABLE: &str =
    "CREATE TABLE products (id BIGINT PRIMARY KEY, name VARCHAR, price DOUBLE, created_at TIMESTAMP);";

/// Create `count` products, two per 250ms tick
fn seed(conn: &Connection, count: u64) {
    conn.execute_batch(CREATE_TABLE).unwrap();
    for id in 1..=count {
        let millis = (id - 1) / 2 * 250;
        conn.execute_batch(&format!(
            "INSERT INTO products VALUES ({id}, 'Product {id}', {id}.25, \
             TIMESTAMP '2024-01-01 00:00:00' + INTERVAL {millis} MILLISECOND);"
        ))
        .unwrap();
    }
}

fn create_database(path: &Path, count: u64) {
    let conn = Connection::open(path).unwrap();
    seed(&conn, count);
}

fn open(path: &Path) -> DuckDbStore {
    DuckDbStore::open(path.to_str().unwrap(), "products").unwrap()
}

fn ids(records: &[pagewise::Record]) -> Vec<u64> {
    records.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn test_offset_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.duckdb");
    create_database(&path, 25);
    let store = open(&path);

    let decoder = ParamDecoder::default();
    let request = decoder
        .offset(&OffsetQuery {
            page: Some("3".into()),
            page_size: Some("10".into()),
        })
        .unwrap();
    let page = OffsetPaginator
        .paginate(&store, request, &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(ids(&page.data), vec![21, 22, 23, 24, 25]);
    assert_eq!(page.total, 25);
    assert_eq!(page.total_page, 3);
    assert_eq!(page.data[0].price, 21.25);
}

#[test_case(1 ; "limit 1")]
#[test_case(4 ; "limit 4")]
#[test_case(25 ; "limit equals total")]
#[tokio::test]
async fn test_cursor_walk(limit: u64) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.duckdb");
    create_database(&path, 25);
    let store = open(&path);
    let decoder = ParamDecoder::default();

    let mut query = CursorQuery {
        cursor: None,
        limit: Some(limit.to_string()),
    };
    let mut seen = Vec::new();
    loop {
        let request = decoder.cursor(&query).unwrap();
        let page = CursorPaginator
            .paginate(&store, request, &RequestContext::new())
            .await
            .unwrap();
        seen.extend(ids(&page.data));
        if !page.has_more {
            break;
        }
        query.cursor = Some(page.next_cursor);
    }

    assert_eq!(seen, (1..=25).collect::<Vec<_>>());
}

#[test_case(3 ; "limit 3")]
#[test_case(5 ; "limit 5")]
#[tokio::test]
async fn test_seek_walk_keeps_sub_second_bounds(limit: u64) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.duckdb");
    create_database(&path, 25);
    let store = open(&path);
    let decoder = ParamDecoder::default();

    let mut query = SeekQuery {
        last_id: None,
        last_created_at: None,
        limit: Some(limit.to_string()),
    };
    let mut seen = Vec::new();
    loop {
        let request = decoder.seek(&query).unwrap();
        let page = SeekPaginator
            .paginate(&store, request, &RequestContext::new())
            .await
            .unwrap();
        seen.extend(ids(&page.data));
        if !page.has_more {
            break;
        }
        query.last_id = Some(page.next_last_id);
        query.last_created_at = Some(page.next_last_created_at);
    }

    assert_eq!(seen, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_token_walk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.duckdb");
    create_database(&path, 10);
    let store = open(&path);
    let decoder = ParamDecoder::default();

    let mut query = TokenQuery {
        token: None,
        limit: Some("3".into()),
    };
    let mut seen = Vec::new();
    let mut counters = Vec::new();
    loop {
        let request = decoder.token(&query).unwrap();
        let page = TokenPaginator
            .paginate(&store, request, &RequestContext::new())
            .await
            .unwrap();
        seen.extend(ids(&page.data));
        counters.push(page.page);
        if !page.has_more {
            break;
        }
        query.token = Some(page.next_token);
    }

    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(counters, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_cursor_stable_while_offset_drifts() {
    let conn = Connection::open_in_memory().unwrap();
    seed(&conn, 20);
    let writer = conn.try_clone().unwrap();
    let store = DuckDbStore::from_connection(conn, "products").unwrap();
    let decoder = ParamDecoder::default();
    let ctx = RequestContext::new();

    let first_offset = OffsetPaginator
        .paginate(&store, decoder.offset(&OffsetQuery::default()).unwrap(), &ctx)
        .await
        .unwrap();
    let first_cursor = CursorPaginator
        .paginate(&store, decoder.cursor(&CursorQuery::default()).unwrap(), &ctx)
        .await
        .unwrap();
    assert_eq!(ids(&first_offset.data), ids(&first_cursor.data));

    // a record already served disappears between requests
    writer.execute_batch("DELETE FROM products WHERE id = 3;").unwrap();

    let second_offset = OffsetPaginator
        .paginate(
            &store,
            decoder
                .offset(&OffsetQuery {
                    page: Some("2".into()),
                    page_size: None,
                })
                .unwrap(),
            &ctx,
        )
        .await
        .unwrap();
    let second_cursor = CursorPaginator
        .paginate(
            &store,
            decoder
                .cursor(&CursorQuery {
                    cursor: Some(first_cursor.next_cursor.clone()),
                    limit: None,
                })
                .unwrap(),
            &ctx,
        )
        .await
        .unwrap();

    // offset skips id 11; the cursor resumes exactly after id 10
    assert_eq!(ids(&second_offset.data), (12..=20).collect::<Vec<_>>());
    assert_eq!(ids(&second_cursor.data), (11..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_open_store_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.duckdb");
    create_database(&path, 4);

    let settings = StoreSettings {
        kind: StoreKind::Duckdb,
        path: path.to_str().unwrap().to_string(),
        ..StoreSettings::default()
    };
    let (store, info) = open_store(&settings).unwrap();

    assert!(info.starts_with("duckdb:"));
    assert_eq!(store.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_router_over_duckdb() {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.duckdb");
    create_database(&path, 6);
    let app = router(Arc::new(open(&path)), &ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/products/seek?limit=2&last_id=2&last_created_at=2024-01-01T00:00:00Z")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"][0]["id"], 3);
    assert_eq!(body["data"][0]["created_at"], "2024-01-01T00:00:00.250Z");
    assert_eq!(body["next_last_id"], "4");
    assert_eq!(body["next_last_created_at"], "2024-01-01T00:00:00.250Z");
    assert_eq!(body["has_more"], true);
}

#[tokio::test]
async fn test_timed_out_scan_does_not_block_other_requests() {
    let conn = Connection::open_in_memory().unwrap();
    // large enough that an ordered scan runs far past a 20ms deadline
    conn.execute_batch(
        "CREATE VIEW products AS \
         SELECT i AS id, 'Product ' || i AS name, 1.0 AS price, \
                TIMESTAMP '2024-01-01 00:00:00' + to_microseconds(i) AS created_at \
         FROM range(1, 100000001) t(i);",
    )
    .unwrap();
    let store = Arc::new(DuckDbStore::from_connection(conn, "products").unwrap());
    let decoder = ParamDecoder::default();

    let slow = SeekPaginator
        .paginate(
            store.as_ref(),
            decoder.seek(&SeekQuery::default()).unwrap(),
            &RequestContext::with_timeout(std::time::Duration::from_millis(20)),
        )
        .await
        .unwrap_err();
    assert!(slow.is_cancelled(), "{slow}");

    // the abandoned scan must not hold up an independent request
    let page = CursorPaginator
        .paginate(
            store.as_ref(),
            decoder
                .cursor(&CursorQuery {
                    cursor: Some("99999990".into()),
                    limit: Some("5".into()),
                })
                .unwrap(),
            &RequestContext::with_timeout(std::time::Duration::from_secs(5)),
        )
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec![99999991, 99999992, 99999993, 99999994, 99999995]);
    assert!(page.has_more);
}
