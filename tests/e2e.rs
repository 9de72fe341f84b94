//! End-to-end tests against a live HTTP content store
//!
//! A mock store is served from a random local port, and the gateway reads it
//! through `HttpContentStore`. The full-stack test also serves the gateway
//! over TCP, so client addresses arrive through `ConnectInfo`.

use axum::{
    Json, Router,
    http::{StatusCode, header},
    routing::get,
};
use bytes::Bytes;
use recipegate::api::{AppState, router};
use recipegate::config::{ByteSize, Config, ContentStoreConfig};
use recipegate::index::SqliteIndex;
use recipegate::recipe::RecipeCoordinates;
use recipegate::storage::{ContentStore, HttpContentStore, StorageError, StoreLayout};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

const REVISION: &str = "4fb6e3981f4b64ebe13aa667d4fc1284";
const DOCUMENT_LIMIT: u64 = 1024;

async fn serve(app: Router) -> Result<String, Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    sleep(Duration::from_millis(100)).await;

    Ok(format!("http://{}", bound_addr))
}

/// Mock content store publishing lyra under the `barbarian` tag
async fn start_mock_store() -> Result<String, Box<dyn std::error::Error>> {
    let root = "/_/_/barbarian";
    let app = Router::new()
        .route(
            &format!("{root}/lyra/1.5.1/latest.json"),
            get(|| async {
                Json(json!({"revision": REVISION, "time": "2020-10-20T03:02:46.710+0000"}))
            }),
        )
        .route(
            &format!("{root}/lyra/1.5.1/{REVISION}/files.json"),
            get(|| async {
                Json(json!({"files": {
                    "conan_export.tgz": {},
                    "conanmanifest.txt": {},
                    "conanfile.py": {}
                }}))
            }),
        )
        .route(
            &format!("{root}/broken/1.0/latest.json"),
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .route(
            &format!("{root}/huge/1.0/latest.json"),
            get(|| async { Bytes::from(vec![b' '; 4 * DOCUMENT_LIMIT as usize]) }),
        );

    serve(app).await
}

fn store_config(base_url: &str) -> ContentStoreConfig {
    ContentStoreConfig {
        base_url: base_url.to_string(),
        max_document_bytes: ByteSize(DOCUMENT_LIMIT),
        ..ContentStoreConfig::default()
    }
}

fn coords(name: &str, version: &str) -> RecipeCoordinates {
    RecipeCoordinates::new(name, version, "_", "_").unwrap()
}

#[tokio::test]
async fn test_http_store_reads_documents() {
    let base = start_mock_store().await.unwrap();
    let store = HttpContentStore::new(&store_config(&base)).unwrap();
    let layout = StoreLayout::new("barbarian");

    let body = store
        .get(&layout.pointer(&coords("lyra", "1.5.1")))
        .await
        .unwrap()
        .expect("pointer document");
    let pointer: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(pointer["revision"], REVISION);

    let listing = store
        .get(&layout.listing(&coords("lyra", "1.5.1"), REVISION))
        .await
        .unwrap();
    assert!(listing.is_some());
}

#[tokio::test]
async fn test_http_store_distinguishes_absence_from_failure() {
    let base = start_mock_store().await.unwrap();
    let store = HttpContentStore::new(&store_config(&base)).unwrap();
    let layout = StoreLayout::new("barbarian");

    let absent = store.get(&layout.pointer(&coords("zlib", "1.2.11"))).await;
    assert!(matches!(absent, Ok(None)));

    let broken = store.get(&layout.pointer(&coords("broken", "1.0"))).await;
    assert!(matches!(
        broken,
        Err(StorageError::UnexpectedStatus { status: 500, .. })
    ));

    let huge = store.get(&layout.pointer(&coords("huge", "1.0"))).await;
    assert!(matches!(huge, Err(StorageError::TooLarge { limit: 1024, .. })));
}

#[tokio::test]
async fn test_http_store_unreachable() {
    // Nothing listens on port 9 of the loopback interface
    let store = HttpContentStore::new(&store_config("http://127.0.0.1:9")).unwrap();
    let layout = StoreLayout::new("barbarian");

    let result = store.get(&layout.pointer(&coords("lyra", "1.5.1"))).await;
    assert!(matches!(
        result,
        Err(StorageError::RequestFailed { .. }) | Err(StorageError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_gateway_over_http_store() {
    let store_base = start_mock_store().await.unwrap();

    let mut config = Config::default();
    config.content_store = store_config(&store_base);
    config.server.public_url = Some("https://recipes.example.com".to_string());

    let index = SqliteIndex::in_memory().await.unwrap();
    let store = HttpContentStore::new(&config.content_store).unwrap();
    let state = AppState::with_sqlite(config, Arc::new(store), index.clone());
    let gateway = serve(router(state)).await.unwrap();

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent("Conan/2.0.14")
        .build()
        .unwrap();

    let latest: Value = client
        .get(format!("{gateway}/github/v2/conans/lyra/1.5.1/_/_/latest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["revision"], REVISION);

    let urls: Value = client
        .get(format!("{gateway}/github/v1/conans/lyra/1.5.1/_/_/download_urls"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(urls.as_object().unwrap().len(), 3);

    let broken = client
        .get(format!("{gateway}/github/v2/conans/broken/1.0/_/_/latest"))
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status(), reqwest::StatusCode::NOT_FOUND);

    let download = client
        .get(format!(
            "{gateway}/github/v2/conans/lyra/1.5.1/_/_/revisions/{REVISION}/files/conan_export.tgz"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), reqwest::StatusCode::FOUND);
    assert_eq!(
        download.headers()[header::LOCATION],
        format!("{store_base}/_/_/barbarian/lyra/1.5.1/{REVISION}/files/conan_export.tgz").as_str()
    );

    // The audit write runs in the background
    let mut recorded: Option<(String, Option<String>, Option<String>)> = None;
    for _ in 0..40 {
        recorded = sqlx::query_as("SELECT package_name, ua, uip FROM track")
            .fetch_optional(index.pool())
            .await
            .unwrap();
        if recorded.is_some() {
            break;
        }
        sleep(Duration::from_millis(25)).await;
    }

    let (name, user_agent, source) = recorded.expect("download was recorded");
    assert_eq!(name, "lyra");
    assert_eq!(user_agent.as_deref(), Some("Conan/2.0.14"));
    assert_eq!(source.as_deref(), Some("127.0.0.1"));
}
