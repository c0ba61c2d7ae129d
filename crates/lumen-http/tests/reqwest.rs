//! End-to-end tests of `ReqwestTransport` against a throwaway HTTP responder.
#![cfg(feature = "reqwest")]

use futures_util::StreamExt;
use lumen_data::{ByteStream, DataFetcher, FetchError, Priority, oneshot_callback};
use lumen_http::{HttpClient, ImageUrl, LoadState, ReqwestTransport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Accept one connection, answer it with `response` and return the raw request.
async fn serve_once(response: &'static [u8]) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}/img.png"), server)
}

fn client() -> HttpClient<ReqwestTransport> {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpClient::new(ReqwestTransport::from_client(client), Handle::current())
        .with_user_agent("lumen-e2e/1.0")
}

async fn read_all(mut stream: ByteStream) -> (Vec<u8>, Option<FetchError>) {
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(e) => return (bytes, Some(e)),
        }
    }
    (bytes, None)
}

#[tokio::test]
async fn test_fetches_body_with_default_agent() {
    let (url, server) =
        serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;
    let fetcher = client().fetcher(ImageUrl::new(url).unwrap());

    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(Priority::Normal, Box::new(callback));
    let stream = rx.await.unwrap().unwrap().expect("stream delivered");

    let (bytes, error) = read_all(stream).await;
    assert_eq!(bytes, b"hello");
    assert!(error.is_none());

    let request = server.await.unwrap().to_ascii_lowercase();
    assert!(request.starts_with("get /img.png http/1.1"));
    assert_eq!(request.matches("user-agent:").count(), 1);
    assert!(request.contains("user-agent: lumen-e2e/1.0"));

    fetcher.cleanup();
    assert_eq!(fetcher.load_state(), LoadState::CleanedUp);
}

#[tokio::test]
async fn test_sends_caller_headers() {
    let (url, server) =
        serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
    let url = ImageUrl::new(url)
        .unwrap()
        .with_header("Accept", "image/webp")
        .with_header("USER-AGENT", "caller/3.0");
    let fetcher = client().fetcher(url);

    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(Priority::High, Box::new(callback));
    let stream = rx.await.unwrap().unwrap().unwrap();
    let (bytes, error) = read_all(stream).await;
    assert!(bytes.is_empty());
    assert!(error.is_none());

    let request = server.await.unwrap().to_ascii_lowercase();
    assert!(request.contains("accept: image/webp"));
    assert_eq!(request.matches("user-agent:").count(), 1);
    assert!(request.contains("user-agent: caller/3.0"));
}

#[tokio::test]
async fn test_error_status_is_delivered() {
    let (url, _server) = serve_once(
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
    )
    .await;
    let fetcher = client().fetcher(ImageUrl::new(url).unwrap());

    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(Priority::Normal, Box::new(callback));
    let stream = rx.await.unwrap().unwrap().unwrap();

    let (bytes, error) = read_all(stream).await;
    assert_eq!(bytes, b"not found");
    assert!(error.is_none());
}

#[tokio::test]
async fn test_truncated_body_surfaces_as_stream_error() {
    let (url, _server) =
        serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\nhello").await;
    let fetcher = client().fetcher(ImageUrl::new(url).unwrap());

    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(Priority::Normal, Box::new(callback));
    let stream = rx.await.unwrap().unwrap().unwrap();

    let (bytes, error) = read_all(stream).await;
    assert!(bytes.len() <= 5);
    assert!(error.is_some());
}

#[tokio::test]
async fn test_connection_refused_fails_load() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = client().fetcher(ImageUrl::new(format!("http://{addr}/img.png")).unwrap());
    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(Priority::Normal, Box::new(callback));

    assert!(matches!(rx.await.unwrap(), Err(FetchError::Transport(_))));
    assert_eq!(fetcher.load_state(), LoadState::Failed);
}

#[tokio::test]
async fn test_invalid_header_fails_load() {
    let url = ImageUrl::new("http://127.0.0.1:9/img.png")
        .unwrap()
        .with_header("Bad Header", "value");
    let fetcher = client().fetcher(url);

    let (callback, rx) = oneshot_callback::<ByteStream>();
    fetcher.load_data(Priority::Normal, Box::new(callback));

    assert!(matches!(rx.await.unwrap(), Err(FetchError::Transport(_))));
}
