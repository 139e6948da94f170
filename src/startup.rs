//! Startup sequencing.
//!
//! Home-directory check, listener bind, WebSocket hub start-up, banner.
//! Only the bind can fail; everything before it is advisory.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::{build_router, RouteTable};
use crate::auth::AuthGate;
use crate::config::{Config, ServerConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::ws::{Acceptor, Hub, HUB_CAPACITY};

/// A bound gateway, ready to serve.
pub struct RunningGateway {
    listener: TcpListener,
    app: Router,
    local_addr: SocketAddr,
    hub: Hub,
    heartbeat: Option<JoinHandle<()>>,
}

impl RunningGateway {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Hub that sub-routers and background tasks publish notifications to.
    pub fn hub(&self) -> Hub {
        self.hub.clone()
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> std::io::Result<()> {
        self.serve_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let result = axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(heartbeat) = self.heartbeat {
            heartbeat.abort();
        }
        tracing::info!("Server stopped");
        result
    }
}

/// Report whether the OpenClaw home directory exists. Never fatal.
pub fn check_home(path: &Path) -> bool {
    let exists = path.exists();
    if exists {
        tracing::info!(home = %path.display(), "Found OpenClaw home");
    } else {
        tracing::warn!(home = %path.display(), "OpenClaw home does not exist");
    }
    exists
}

/// Bind the single listener shared by HTTP and WebSocket traffic.
pub async fn bind(server: &ServerConfig) -> GatewayResult<TcpListener> {
    let addr = server.addr();
    match TcpListener::bind(&addr).await {
        Ok(listener) => Ok(listener),
        Err(source) => Err(GatewayError::Bind { addr, source }),
    }
}

/// Run the startup sequence up to a bound, fully wired gateway.
pub async fn start(config: &Config, table: RouteTable) -> GatewayResult<RunningGateway> {
    check_home(&config.home_path);

    let gate = AuthGate::from_config(&config.auth);
    if gate.is_enabled() {
        tracing::info!(
            guard_upgrades = gate.guards_upgrades(),
            "Bearer authentication enabled"
        );
    } else {
        tracing::warn!("MONITOR_API_TOKEN not set - running without authentication");
    }

    let listener = bind(&config.server).await?;
    let local_addr = listener.local_addr().map_err(|source| GatewayError::Bind {
        addr: config.server.addr(),
        source,
    })?;

    // The acceptor only exists once the listener is live.
    let hub = Hub::new(HUB_CAPACITY);
    let heartbeat = (config.ws.heartbeat_secs > 0)
        .then(|| hub.spawn_heartbeat(Duration::from_secs(config.ws.heartbeat_secs)));

    let routes: Vec<&str> = table.prefixes().collect();
    let banner = [
        format!("OpenClaw Monitor API v{}", env!("CARGO_PKG_VERSION")),
        format!("listening on {local_addr}"),
        format!("OPENCLAW_HOME: {}", config.home_path.display()),
        format!(
            "auth: {}",
            if gate.is_enabled() { "bearer token" } else { "disabled" }
        ),
        format!("{} route groups: {}", table.len(), routes.join(", ")),
    ];
    print_banner(&banner);

    let app = build_router(table, gate, Acceptor::new(hub.clone()));

    Ok(RunningGateway {
        listener,
        app,
        local_addr,
        hub,
        heartbeat,
    })
}

fn print_banner(lines: &[String]) {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    tracing::info!("╔{}╗", "═".repeat(width));
    for line in lines {
        tracing::info!("║  {:<w$}║", line, w = width - 2);
    }
    tracing::info!("╚{}╝", "═".repeat(width));
}

/// Resolves on the first Ctrl-C or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, Stream, StreamExt};
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio_tungstenite::tungstenite::{client::IntoClientRequest, Error as WsError, Message};

    use crate::config::{AuthConfig, WsConfig};
    use crate::logging;
    use crate::ws::Notification;

    fn test_config(token: Option<&str>, guard_upgrades: bool) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            home_path: std::env::temp_dir(),
            auth: AuthConfig {
                token: token.map(String::from),
                require_auth_for_upgrade: guard_upgrades,
                constant_time_compare: false,
            },
            ws: WsConfig { heartbeat_secs: 0 },
        }
    }

    /// Start a gateway on an ephemeral port. Dropping the sender stops it.
    async fn spawn(config: Config) -> (SocketAddr, Hub, oneshot::Sender<()>) {
        logging::init_test();
        let table = RouteTable::with_unmounted_domains().unwrap();
        let gateway = start(&config, table).await.unwrap();
        let addr = gateway.local_addr();
        let hub = gateway.hub();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(gateway.serve_until(async move {
            let _ = rx.await;
        }));
        (addr, hub, tx)
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn next_json<S>(socket: &mut S) -> Value
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let message = socket.next().await.unwrap().unwrap();
        serde_json::from_str(message.to_text().unwrap()).unwrap()
    }

    #[test]
    fn test_check_home() {
        assert!(check_home(&std::env::temp_dir()));
        assert!(!check_home(Path::new("/definitely/not/an/openclaw/home")));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = test_config(None, false);
        config.server.port = occupied.local_addr().unwrap().port();

        let result = start(&config, RouteTable::new()).await;
        assert!(matches!(result, Err(GatewayError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_health_check_over_listener() {
        let (addr, _hub, _stop) = spawn(test_config(Some("S"), false)).await;
        let response = raw_get(addr, "/").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains(r#"{"status":"ok","name":"openclaw-monitor-api"}"#));

        let response = raw_get(addr, "/api/cron").await;
        assert!(response.starts_with("HTTP/1.1 401"), "{response}");
    }

    #[tokio::test]
    async fn test_websocket_shares_listener() {
        let (addr, hub, _stop) = spawn(test_config(Some("S"), false)).await;

        // No bearer token: upgrades are not gated by default.
        let url = format!("ws://{addr}/anywhere");
        let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

        let hello = next_json(&mut socket).await;
        assert_eq!(hello["type"], "connected");
        assert!(hello["payload"]["clientId"].is_string());

        socket.send(Message::text("ping")).await.unwrap();
        assert_eq!(next_json(&mut socket).await["type"], "pong");

        let delivered = hub.publish(Notification::new("processes.changed", json!({ "pid": 42 })));
        assert_eq!(delivered, 1);
        let pushed = next_json(&mut socket).await;
        assert_eq!(pushed["type"], "processes.changed");
        assert_eq!(pushed["payload"]["pid"], 42);
    }

    #[tokio::test]
    async fn test_guarded_websocket_requires_token() {
        let (addr, _hub, _stop) = spawn(test_config(Some("S"), true)).await;
        let url = format!("ws://{addr}/");

        let denied = tokio_tungstenite::connect_async(url.clone()).await;
        match denied {
            Err(WsError::Http(response)) => assert_eq!(response.status(), 401),
            Err(e) => panic!("expected 401, got {e}"),
            Ok(_) => panic!("expected 401, upgrade succeeded"),
        }

        let mut request = url.into_client_request().unwrap();
        request
            .headers_mut()
            .insert("authorization", "Bearer S".parse().unwrap());
        let (mut socket, _) = tokio_tungstenite::connect_async(request).await.unwrap();
        assert_eq!(next_json(&mut socket).await["type"], "connected");
    }
}
