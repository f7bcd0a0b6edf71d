use std::sync::Arc;

use axum::http::StatusCode;
use image::{Rgba, RgbaImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use rasterpad::export::{self, ExportResponse, NO_CANVASES_PAGE, NOT_FOUND_PAGE, SharedCanvases};

fn shared_with(names: &[&str]) -> SharedCanvases {
    let shared = SharedCanvases::new();
    shared.publish(
        names
            .iter()
            .map(|n| (n.to_string(), RgbaImage::from_pixel(3, 2, Rgba([0, 128, 255, 255])))),
    );
    shared
}

fn html(resp: ExportResponse) -> (StatusCode, String) {
    match resp {
        ExportResponse::Html { status, body } => (status, body),
        ExportResponse::Png(_) => panic!("expected an HTML page"),
    }
}

#[test]
fn empty_map_serves_offline_page() {
    let shared = SharedCanvases::new();
    assert_eq!(html(export::respond(&shared, "/")), (StatusCode::OK, NO_CANVASES_PAGE.to_string()));
    assert_eq!(
        html(export::respond(&shared, "/index.html")),
        (StatusCode::OK, NO_CANVASES_PAGE.to_string())
    );
}

#[test]
fn index_lists_sorted_links() {
    let shared = shared_with(&["zeta", "alpha"]);
    let (status, body) = html(export::respond(&shared, "/"));
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Shared Canvases</h1>"));
    let a = body.find("<li><a href=\"/alpha.png\">alpha</a></li>").unwrap();
    let z = body.find("<li><a href=\"/zeta.png\">zeta</a></li>").unwrap();
    assert!(a < z);
}

#[test]
fn png_lookup() {
    let shared = shared_with(&["sketch"]);
    match export::respond(&shared, "/sketch.png") {
        ExportResponse::Png(bytes) => {
            let img = image::load_from_memory(&bytes).unwrap().into_rgba8();
            assert_eq!(img.dimensions(), (3, 2));
            assert_eq!(*img.get_pixel(1, 1), Rgba([0, 128, 255, 255]));
        }
        other => panic!("expected PNG, got {:?}", other),
    }
    assert_eq!(
        html(export::respond(&shared, "/missing.png")),
        (StatusCode::NOT_FOUND, NOT_FOUND_PAGE.to_string())
    );
    assert_eq!(html(export::respond(&shared, "/sketch")).0, StatusCode::NOT_FOUND);
}

#[test]
fn publish_replaces_wholesale() {
    let shared = shared_with(&["a", "b"]);
    shared.publish(vec![("c".to_string(), RgbaImage::new(1, 1))]);
    assert_eq!(shared.names(), vec!["c".to_string()]);
    assert!(shared.get("a").is_none());

    shared.publish(Vec::new());
    assert!(shared.is_empty());
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8_lossy(&raw).into_owned()
}

#[tokio::test]
async fn serves_over_http() {
    let shared = Arc::new(shared_with(&["board"]));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(export::serve_on(listener, shared.clone()));

    let index = get(addr, "/").await;
    assert!(index.starts_with("HTTP/1.1 200"));
    assert!(index.contains("/board.png"));

    let png = get(addr, "/board.png").await;
    assert!(png.starts_with("HTTP/1.1 200"));
    assert!(png.to_lowercase().contains("content-type: image/png"));

    let missing = get(addr, "/nope.png").await;
    assert!(missing.starts_with("HTTP/1.1 404"));

    server.abort();
}

#[test]
fn encoded_names_resolve() {
    let shared = shared_with(&["my pic", "zürich"]);
    assert!(matches!(export::respond(&shared, "/my%20pic.png"), ExportResponse::Png(_)));
    assert!(matches!(export::respond(&shared, "/z%C3%BCrich.png"), ExportResponse::Png(_)));

    let (_, body) = html(export::respond(&shared, "/"));
    assert!(body.contains("<a href=\"/my%20pic.png\">my pic</a>"));
}

#[tokio::test]
async fn serves_names_with_spaces_over_http() {
    let shared = Arc::new(shared_with(&["my pic"]));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(export::serve_on(listener, shared.clone()));

    let png = get(addr, "/my%20pic.png").await;
    assert!(png.starts_with("HTTP/1.1 200"));
    assert!(png.to_lowercase().contains("content-type: image/png"));

    server.abort();
}
