// tests/http_store.rs

mod common;
use crate::common::{init_tracing, payload};

use std::error::Error;
use std::sync::{Arc, Mutex};

use runxfer::Url;
use runxfer::transfer::{BlobStore, HttpBlobStore, RetryPolicy, TransferEngine, block_id};
use runxfer_test_utils::with_timeout;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type TestResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Minimal HTTP/1.1 server: every `GET` answers `500` for the first
/// `fail_gets` requests and then `200` with `object`; every `PUT` answers
/// `201`. One request per connection.
struct TestServer {
    base: Url,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    async fn start(object: Vec<u8>, fail_gets: usize) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base = Url::parse(&format!("http://{}/", listener.local_addr()?)).expect("valid url");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            let object = Arc::new(object);
            let gets = Arc::new(Mutex::new(0usize));
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let recorded = recorded.clone();
                let object = object.clone();
                let gets = gets.clone();
                tokio::spawn(async move {
                    let _ = serve(socket, recorded, object, gets, fail_gets).await;
                });
            }
        });

        Ok(Self { base, requests })
    }

    fn url(&self, path: &str) -> Url {
        self.base.join(path).expect("valid path")
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(
    mut socket: TcpStream,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    object: Arc<Vec<u8>>,
    gets: Arc<Mutex<usize>>,
    fail_gets: usize,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let header_end = loop {
        let mut chunk = [0u8; 4096];
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0u8; 4096];
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let is_get = method == "GET";
    recorded.lock().unwrap().push(Recorded {
        method,
        target,
        headers,
        body,
    });

    let (status, payload): (&str, &[u8]) = if is_get {
        let mut count = gets.lock().unwrap();
        *count += 1;
        if *count <= fail_gets {
            ("500 Internal Server Error", b"".as_slice())
        } else {
            ("200 OK", object.as_slice())
        }
    } else {
        ("201 Created", b"".as_slice())
    };

    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        payload.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.write_all(payload).await?;
    socket.shutdown().await
}

#[tokio::test]
async fn get_streams_the_object_body() -> TestResult {
    init_tracing();

    let data = payload(50_000);
    let server = TestServer::start(data.clone(), 0).await?;
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("clip.mp4");

    let engine = TransferEngine::new(Arc::new(HttpBlobStore::new(None)?));
    let result = with_timeout(engine.download_to(&server.url("videos/clip.mp4"), &file, "DL")).await;

    assert!(result.success(), "output: {}", result.output());
    assert_eq!(std::fs::read(&file)?, data);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/videos/clip.mp4");
    Ok(())
}

#[tokio::test]
async fn server_errors_are_retried() -> TestResult {
    init_tracing();

    let data = payload(100);
    let server = TestServer::start(data.clone(), 2).await?;
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("clip.mp4");

    let engine = TransferEngine::new(Arc::new(HttpBlobStore::new(None)?))
        .with_retry_policy(RetryPolicy::immediate(5));
    let result = with_timeout(engine.download_to(&server.url("clip.mp4"), &file, "DL")).await;

    assert!(result.success(), "output: {}", result.output());
    assert_eq!(server.requests().len(), 3);
    assert_eq!(std::fs::read(&file)?, data);
    Ok(())
}

#[tokio::test]
async fn persistent_server_error_is_reported() -> TestResult {
    init_tracing();

    let server = TestServer::start(Vec::new(), usize::MAX).await?;
    let dir = tempfile::tempdir()?;
    let uri = server.url("clip.mp4");

    let engine = TransferEngine::new(Arc::new(HttpBlobStore::new(None)?))
        .with_retry_policy(RetryPolicy::immediate(2));
    let result = with_timeout(engine.download_to(&uri, &dir.path().join("clip.mp4"), "DL")).await;

    assert!(!result.success());
    assert!(result.output().contains("500"), "output: {}", result.output());
    assert!(result.output().ends_with(uri.as_str()));
    assert_eq!(server.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn block_protocol_puts_blocks_then_block_list() -> TestResult {
    init_tracing();

    let server = TestServer::start(Vec::new(), 0).await?;
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("video.mp4");
    let data = payload(2500);
    std::fs::write(&file, &data)?;

    let mut uri = server.url("out/video.mp4");
    uri.set_query(Some("sig=secret"));

    let engine =
        TransferEngine::new(Arc::new(HttpBlobStore::new(None)?)).with_block_size(1000);
    let result = with_timeout(engine.upload_to(&file, &uri, "UP")).await;
    assert!(result.success(), "output: {}", result.output());

    let requests = server.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.method == "PUT"));
    assert!(requests.iter().all(|r| r.header("x-ms-version") == Some("2021-08-06")));

    let mut blocks: Vec<&Recorded> = requests
        .iter()
        .filter(|r| r.target.contains("comp=block&"))
        .collect();
    blocks.sort_by(|a, b| a.target.cmp(&b.target));
    assert_eq!(blocks.len(), 3);
    for (index, block) in blocks.iter().enumerate() {
        assert_eq!(
            block.target,
            format!("/out/video.mp4?sig=secret&comp=block&blockid={}", block_id(index))
        );
    }
    let staged: Vec<u8> = blocks.iter().flat_map(|b| b.body.clone()).collect();
    assert_eq!(staged, data);

    let commit = requests.last().expect("commit request");
    assert_eq!(commit.target, "/out/video.mp4?sig=secret&comp=blocklist");
    assert_eq!(commit.header("content-type"), Some("application/xml"));
    let expected = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><BlockList><Latest>{}</Latest><Latest>{}</Latest><Latest>{}</Latest></BlockList>"#,
        block_id(0),
        block_id(1),
        block_id(2)
    );
    assert_eq!(String::from_utf8(commit.body.clone())?, expected);
    Ok(())
}

#[tokio::test]
async fn put_block_sends_raw_bytes() -> TestResult {
    init_tracing();

    let server = TestServer::start(Vec::new(), 0).await?;
    let store = HttpBlobStore::new(None)?;
    let uri = server.url("blob");

    with_timeout(store.put_block(&uri, "abc", b"hello".to_vec())).await?;

    let requests = server.requests();
    assert_eq!(requests[0].target, "/blob?comp=block&blockid=abc");
    assert_eq!(requests[0].body, b"hello");
    Ok(())
}
