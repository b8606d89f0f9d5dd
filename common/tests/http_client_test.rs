use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use common::error::Errno;
use common::http_client::{parse_proxy_uri, HttpBody, HttpClient, HttpMethod, TransportOptions};
use common::runtime::Executor;

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// answers one request with 200 and hands back its head.
fn one_shot_proxy() -> (u16, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.ends_with(b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        stream.write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok").unwrap();
        tx.send(String::from_utf8_lossy(&head).into_owned()).unwrap();
    });
    (port, rx)
}

#[test]
fn test_request_to_closed_port()->Result<(), String> {
    let url = format!("http://127.0.0.1:{}/bucket/object", closed_port());
    let exec = Executor::create_single_threaded().map_err(|err| err.to_string())?;
    let client = HttpClient::new(2, &exec).map_err(|err| err.to_string())?;
    let ret = client.request(&url, HttpBody::Empty, &HttpMethod::Get);
    match ret {
        Err(Errno::Ehttp(msg)) => {
            assert!(msg.contains("in 2 times"), "{}", msg);
            Ok(())
        }
        other => Err(format!("expect http error, got {:?}", other)),
    }
}

#[test]
fn test_request_with_invalid_url() {
    let exec = Executor::create_single_threaded().unwrap();
    let client = HttpClient::new(1, &exec).unwrap();
    let ret = client.request("http://bad host/", HttpBody::Empty, &HttpMethod::Get);
    assert!(matches!(ret, Err(Errno::Einval(_))));
}

#[test]
fn test_request_through_proxy() {
    let (port, rx) = one_shot_proxy();
    let exec = Executor::create_single_threaded().unwrap();
    let opts = TransportOptions {
        proxy_host: format!("127.0.0.1:{}", port),
        proxy_user: "user".to_string(),
        proxy_pwd: "pwd".to_string(),
        skip_verify_cert: true,
        ..Default::default()
    };
    let client = HttpClient::with_transport(1, &opts, &exec).unwrap();
    // the target host does not resolve, only the proxy is dialed.
    let resp = client.request("http://s3.objcli.invalid/bucket/object", HttpBody::Empty, &HttpMethod::Get).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "ok");

    let head = rx.recv().unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get http://s3.objcli.invalid/bucket/object http/1.1\r\n"), "{}", head);
    // base64 of user:pwd
    assert!(head.contains("proxy-authorization: basic dxnlcjpwd2q=\r\n"), "{}", head);
    assert!(!head.contains("\r\nauthorization:"), "{}", head);
}

#[test]
fn test_parse_proxy_uri() {
    let uri = parse_proxy_uri("proxy.test.com:3128").unwrap();
    assert_eq!(uri.scheme_str(), Some("http"));
    assert_eq!(uri.host(), Some("proxy.test.com"));
    assert_eq!(uri.port_u16(), Some(3128));
    assert_eq!(parse_proxy_uri("http://10.0.0.1:8080").unwrap().host(), Some("10.0.0.1"));
    assert!(matches!(parse_proxy_uri("bad host:1"), Err(Errno::Econfig(_))));
    assert!(matches!(parse_proxy_uri(""), Err(Errno::Econfig(_))));

    let exec = Executor::create_single_threaded().unwrap();
    let opts = TransportOptions {
        proxy_host: "bad host:1".to_string(),
        ..Default::default()
    };
    assert!(matches!(HttpClient::with_transport(1, &opts, &exec), Err(Errno::Econfig(_))));
}
