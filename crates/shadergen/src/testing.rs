//! One-shot HTTP stand-in for the generation service.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Serves exactly one request with `status` (e.g. `"200 OK"`) and a JSON
/// `body`. Returns the endpoint to call and a handle yielding the raw request
/// body the stub received.
pub fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let address = listener.local_addr().expect("stub listener address");
    let endpoint = format!("http://{address}/api/generate-shader");
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept stub connection");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stub stream"));
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request header");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().expect("numeric content-length");
            }
        }
        let mut request = vec![0; content_length];
        reader.read_exact(&mut request).expect("read request body");

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write stub response");
        stream.flush().expect("flush stub response");
        String::from_utf8(request).expect("utf-8 request body")
    });
    (endpoint, handle)
}

/// An endpoint on a local port nobody listens on.
pub fn refused_endpoint() -> String {
    let port = TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("reserve local port")
        .port();
    format!("http://127.0.0.1:{port}/api/generate-shader")
}
