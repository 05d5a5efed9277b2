use aptgrid_core::store::source::SourceError;
use aptgrid_core::{DatasetSource, HttpSource, LoadOutcome, OccupancyStore};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Serves one connection on a loopback port and returns its URL.
///
/// `reply` of `None` accepts the request and never answers.
fn serve_once(reply: Option<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        read_request_head(&stream);
        match reply {
            Some(reply) => {
                let _ = stream.write_all(reply.as_bytes());
                let _ = stream.flush();
            }
            None => thread::sleep(Duration::from_secs(3)),
        }
    });
    format!("http://{addr}/apartments_status.json")
}

fn read_request_head(stream: &TcpStream) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    while reader.read_line(&mut line).map_or(false, |read| read > 0) {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
}

fn http_reply(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[test]
fn silent_server_times_out_into_degraded_load() {
    let url = serve_once(None);
    let source = HttpSource::new(url, Duration::from_millis(100));

    let started = Instant::now();
    let (store, outcome) = OccupancyStore::load_with_outcome(&source);

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(outcome.is_degraded());
    assert_eq!(store, OccupancyStore::empty());
    assert_eq!(store.free_count(), 140);
}

#[test]
fn error_status_is_reported_and_degrades() {
    let url = serve_once(Some(http_reply("503 Service Unavailable", "")));
    let source = HttpSource::new(url.clone(), Duration::from_secs(2));

    match source.fetch() {
        Err(SourceError::HttpStatus { url: failed, status }) => {
            assert_eq!(status, 503);
            assert_eq!(failed, url);
        }
        other => panic!("unexpected fetch result: {other:?}"),
    }

    let url = serve_once(Some(http_reply("404 Not Found", "")));
    let (_, outcome) = OccupancyStore::load_with_outcome(&HttpSource::new(url, Duration::from_secs(2)));
    match outcome {
        LoadOutcome::Unavailable { reason } => assert!(reason.contains("404")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn successful_response_loads_dataset() {
    let body = r#"{"3": {"5": {"owner": "Ivanov", "area": "54.2"}}}"#;
    let url = serve_once(Some(http_reply("200 OK", body)));

    let (store, outcome) =
        OccupancyStore::load_with_outcome(&HttpSource::new(url, Duration::from_secs(2)));

    assert!(!outcome.is_degraded());
    assert_eq!(store.occupied_count(), 1);
}
