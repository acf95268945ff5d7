use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Loopback stand-in for the GitHub releases API serving one stable asset.
pub struct ReleaseFixture {
    base_url: String,
    asset_requests: Arc<AtomicUsize>,
    release_query: Arc<Mutex<Option<String>>>,
    stop_tx: Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

struct Routes {
    base_url: String,
    asset_name: String,
    asset_body: Vec<u8>,
    asset_requests: Arc<AtomicUsize>,
    release_query: Arc<Mutex<Option<String>>>,
}

impl ReleaseFixture {
    pub fn start(asset_name: &str, asset_body: &[u8]) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);
        let asset_requests = Arc::new(AtomicUsize::new(0));
        let release_query = Arc::new(Mutex::new(None));
        let routes = Routes {
            base_url: base_url.clone(),
            asset_name: asset_name.to_string(),
            asset_body: asset_body.to_vec(),
            asset_requests: asset_requests.clone(),
            release_query: release_query.clone(),
        };
        let (tx, rx) = mpsc::channel::<()>();
        let join = thread::spawn(move || run_loop(listener, rx, routes));
        Ok(Self {
            base_url,
            asset_requests,
            release_query,
            stop_tx: tx,
            join: Some(join),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn asset_requests(&self) -> usize {
        self.asset_requests.load(Ordering::SeqCst)
    }

    pub fn last_release_query(&self) -> Option<String> {
        self.release_query
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl Drop for ReleaseFixture {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

fn run_loop(listener: TcpListener, stop_rx: mpsc::Receiver<()>, routes: Routes) {
    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }
        match listener.accept() {
            Ok((mut stream, _addr)) => {
                let _ = stream.set_nonblocking(false);
                let _ = handle_connection(&mut stream, &routes);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => break,
        }
    }
}

fn handle_connection(stream: &mut std::net::TcpStream, routes: &Routes) -> anyhow::Result<()> {
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf)?;
    if n == 0 {
        return Ok(());
    }
    let req = String::from_utf8_lossy(&buf[..n]);
    let path = parse_path(&req).unwrap_or("/");
    let (status, content_type, body) = route(path, routes);
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(&body)?;
    stream.flush()?;
    Ok(())
}

fn parse_path(req: &str) -> Option<&str> {
    let line = req.lines().next()?;
    let mut parts = line.split_whitespace();
    let _method = parts.next()?;
    parts.next()
}

fn route(target: &str, routes: &Routes) -> (&'static str, &'static str, Vec<u8>) {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    if path == "/repos/meilisearch/meilisearch/releases" {
        if let Ok(mut last) = routes.release_query.lock() {
            *last = query.map(str::to_string);
        }
        let body = serde_json::json!([
            {
                "tag_name": "v9.9.9-rc.0",
                "prerelease": true,
                "draft": false,
                "assets": [{
                    "name": routes.asset_name,
                    "browser_download_url": format!("{}/download/rc/{}", routes.base_url, routes.asset_name)
                }]
            },
            {
                "tag_name": "v1.0.0",
                "prerelease": false,
                "draft": false,
                "assets": [{
                    "name": routes.asset_name,
                    "browser_download_url": format!("{}/download/stable/{}", routes.base_url, routes.asset_name)
                }]
            }
        ]);
        return ("200 OK", "application/json", body.to_string().into_bytes());
    }
    if path == format!("/download/stable/{}", routes.asset_name) {
        routes.asset_requests.fetch_add(1, Ordering::SeqCst);
        return (
            "200 OK",
            "application/octet-stream",
            routes.asset_body.clone(),
        );
    }
    ("404 Not Found", "text/plain", b"not found".to_vec())
}
