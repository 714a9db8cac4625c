use ecoguard::config::{AppConfig, Config, CookieProfile};
use ecoguard::{App, GuardProxy, Session, SessionStore};
use pingora::proxy::http_proxy_service;
use pingora::server::Server;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Backend that answers every request with `200`, a `theme` cookie of its
/// own, and the `X-Real-IP` it received as the body.
pub async fn spawn_mock_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let real_ip = request
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("x-real-ip")
                                .then(|| value.trim().to_string())
                        })
                        .unwrap_or_default();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nSet-Cookie: theme=dark\r\n\
                         Connection: close\r\n\r\n{real_ip}",
                        real_ip.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        }
    });

    port
}

pub fn create_test_config(backend_port: u16, admin_hosts: Vec<String>) -> Arc<Config> {
    let backend_url = format!("http://127.0.0.1:{backend_port}");
    Arc::new(Config {
        admin: AppConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            backend_url: backend_url.clone(),
        },
        user: AppConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            backend_url,
        },
        session_secret: "0000000000000000000000000000000000000000000000000000000000000000"
            .to_string(),
        session_cookie: CookieProfile {
            name: "eco_session".to_string(),
            ttl_secs: 3600,
        },
        admin_session_cookie: CookieProfile {
            name: "eco_admin_session".to_string(),
            ttl_secs: 7200,
        },
        admin_hosts,
        cookie_secure: false,
        trust_forwarded_for: false,
        public_scheme: "http".to_string(),
        log_format: "pretty".to_string(),
        coop_policy: "same-origin".to_string(),
    })
}

/// Same as [`create_test_config`], behind a trusted front proxy.
pub fn create_trusted_config(backend_port: u16, admin_hosts: Vec<String>) -> Arc<Config> {
    let mut config = (*create_test_config(backend_port, admin_hosts)).clone();
    config.trust_forwarded_for = true;
    Arc::new(config)
}

/// Sends `GET <target>` verbatim, bypassing client-side URL normalization,
/// and returns the response status line.
pub async fn raw_get(port: u16, target: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request =
        format!("GET {target} HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Runs a pingora server guarding `app` and returns its port.
pub async fn spawn_guard(app: App, config: Arc<Config>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    std::thread::spawn(move || {
        let store = Arc::new(SessionStore::new(&config).unwrap());
        let proxy = GuardProxy::new(app, config, store);

        let server_conf = Arc::new(pingora::server::configuration::ServerConf::default());
        let mut service = http_proxy_service(&server_conf, proxy);
        service.add_tcp(&format!("127.0.0.1:{port}"));

        let mut server = Server::new(None).unwrap();
        server.bootstrap();
        server.add_service(service);
        server.run_forever();
    });

    tokio::time::sleep(Duration::from_secs(3)).await;
    port
}

/// `name=value` pair of a freshly issued session cookie.
pub fn session_cookie(config: &Config, session: &Session, host: &str) -> String {
    let store = SessionStore::new(config).unwrap();
    let header = store.issue(session, host).unwrap();
    header.split(';').next().unwrap().to_string()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn set_cookies(resp: &reqwest::Response) -> Vec<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
