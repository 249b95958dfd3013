use std::{sync::Arc, time::Duration};

use anyhow::Result;
use routebook_core::{
    catalog::FetchError, HttpRouteSource, MemoryStore, RouteCatalog, RouteOrigin, RouteSource,
};
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

/// Serve a single canned HTTP response and return the base URL.
async fn serve_once(status_line: &'static str, body: String) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    Ok(format!("http://{addr}"))
}

fn source(base_url: &str) -> Result<HttpRouteSource> {
    Ok(HttpRouteSource::new(base_url, Duration::from_secs(5))?)
}

#[tokio::test]
async fn fetches_and_decodes_routes() -> Result<()> {
    let body = json!([
        {
            "id": "3",
            "route": "Harbour Line",
            "type": "Ferry",
            "from": "Quay",
            "to": "Island",
            "duration": "20 mins",
            "price": "$4.00",
            "frequency": "Hourly",
            "status": "Active",
            "image": "https://example.com/ferry.jpg",
            "description": "Scenic crossing.",
            "operator": "Bay Ferries",
            "schedule": ["8:00 AM", "9:00 AM"]
        }
    ])
    .to_string();
    let base = serve_once("200 OK", body).await?;

    let routes = source(&base)?.fetch_routes().await?;
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].id, 3);
    assert_eq!(routes[0].operator, "Bay Ferries");
    assert_eq!(routes[0].schedule.len(), 2);
    Ok(())
}

#[tokio::test]
async fn error_status_is_reported() -> Result<()> {
    let base = serve_once("404 Not Found", "\"Not found\"".to_string()).await?;

    let err = source(&base)?
        .fetch_routes()
        .await
        .expect_err("404 must fail");
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() -> Result<()> {
    let base = serve_once("200 OK", "{\"routes\": []}".to_string()).await?;

    let err = source(&base)?
        .fetch_routes()
        .await
        .expect_err("object body must fail");
    assert!(matches!(err, FetchError::Decode(_)));
    Ok(())
}

#[tokio::test]
async fn catalog_masks_server_errors_with_builtin_routes() -> Result<()> {
    let base = serve_once("500 Internal Server Error", "oops".to_string()).await?;
    let catalog = RouteCatalog::new(Arc::new(MemoryStore::new()), Arc::new(source(&base)?));

    assert_eq!(catalog.fetch_routes().await, RouteOrigin::Fallback);
    let names: Vec<String> = catalog.routes().into_iter().map(|route| route.route).collect();
    assert_eq!(names, vec!["Route 101".to_string(), "Blue Line".to_string()]);
    Ok(())
}
