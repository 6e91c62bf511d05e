// ABOUTME: Loopback HTTP listener that captures the OAuth redirect
// ABOUTME: Serves /callback on the localhost port (IPv4 and IPv6 loopback) and forwards the first code or error

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::{
    collections::HashMap,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, error, info, warn};

use crate::error::{AuthError, AuthResult};

pub const CALLBACK_PATH: &str = "/callback";

/// Receiving ends of the listener's single-slot outcome channels
pub struct CallbackSignals {
    pub code_rx: mpsc::Receiver<String>,
    pub error_rx: mpsc::Receiver<AuthError>,
}

#[derive(Clone)]
struct CallbackState {
    code_tx: mpsc::Sender<String>,
    error_tx: mpsc::Sender<AuthError>,
    expected_state: Option<Arc<str>>,
    delivered: Arc<AtomicBool>,
}

impl CallbackState {
    /// Only the first outcome is forwarded. Sends never block: if the
    /// coordinator has already gone, the value is dropped.
    fn claim(&self) -> bool {
        !self.delivered.swap(true, Ordering::SeqCst)
    }

    fn send_code(&self, code: String) {
        if !self.claim() {
            warn!("Ignoring duplicate OAuth callback");
            return;
        }
        if self.code_tx.try_send(code).is_err() {
            debug!("Authorization code arrived after the session ended");
        }
    }

    fn send_error(&self, err: AuthError) {
        if !self.claim() {
            warn!("Ignoring OAuth callback error after an outcome was delivered: {}", err);
            return;
        }
        if self.error_tx.try_send(err).is_err() {
            debug!("Callback error arrived after the session ended");
        }
    }
}

/// Running callback listener. Owns the bound port until shut down or dropped.
pub struct CallbackListener {
    addr: SocketAddr,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Bind `127.0.0.1:<port>` and start serving the callback route.
    ///
    /// The redirect URI names `localhost`, which browsers may resolve to
    /// `::1` first, so the same port is also served on `[::1]` when the host
    /// allows it. Only the IPv4 bind is required.
    ///
    /// When `expected_state` is set, a callback carrying a different `state`
    /// is rejected.
    pub async fn bind(
        port: u16,
        expected_state: Option<String>,
    ) -> AuthResult<(Self, CallbackSignals)> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Listener(format!("Failed to bind to {}: {}", addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::Listener(format!("Failed to determine port: {}", e)))?;

        let v6_addr = SocketAddr::from((Ipv6Addr::LOCALHOST, addr.port()));
        let v6_listener = match TcpListener::bind(v6_addr).await {
            Ok(v6_listener) => Some(v6_listener),
            Err(e) => {
                debug!("Not serving the callback on {}: {}", v6_addr, e);
                None
            }
        };

        let (code_tx, code_rx) = mpsc::channel(1);
        let (error_tx, error_rx) = mpsc::channel(1);

        let state = CallbackState {
            code_tx,
            error_tx,
            expected_state: expected_state.map(Arc::from),
            delivered: Arc::new(AtomicBool::new(false)),
        };

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let v4 = serve(listener, app.clone(), shutdown_rx.clone());
            match v6_listener {
                Some(v6_listener) => {
                    tokio::join!(v4, serve(v6_listener, app, shutdown_rx));
                }
                None => v4.await,
            }
        });

        info!("📡 Waiting for OAuth callback on {}", addr);

        Ok((
            Self {
                addr,
                shutdown_tx: Some(shutdown_tx),
                handle: Some(handle),
            },
            CallbackSignals { code_rx, error_rx },
        ))
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Redirect URI registered with the provider for this listener
    pub fn redirect_uri(&self) -> String {
        redirect_uri_for(self.addr.port())
    }

    /// Stop accepting connections and wait up to `grace` for in-flight
    /// requests. After the grace period the server task is aborted. Either
    /// way the port is released when this returns.
    pub async fn shutdown(mut self, grace: Duration) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }

        let Some(mut handle) = self.handle.take() else {
            return;
        };

        match timeout(grace, &mut handle).await {
            Ok(Ok(())) => debug!("Callback listener on {} stopped", self.addr),
            Ok(Err(e)) => error!("Callback listener task failed: {}", e),
            Err(_) => {
                warn!(
                    "Callback listener did not stop within {:?}, forcing close",
                    grace
                );
                handle.abort();
                // Wait for the task to drop so the socket is closed
                let _ = handle.await;
            }
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn serve(listener: TcpListener, app: Router, mut shutdown_rx: watch::Receiver<bool>) {
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // A dropped sender also stops the server
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .await;
    if let Err(e) = result {
        error!("OAuth callback server error: {}", e);
    }
}

pub fn redirect_uri_for(port: u16) -> String {
    format!("http://localhost:{}{}", port, CALLBACK_PATH)
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(reason) = params.get("error") {
        warn!("Provider returned an error to the callback: {}", reason);
        state.send_error(AuthError::Listener(format!(
            "Authorization denied by provider: {}",
            reason
        )));
        return (
            StatusCode::BAD_REQUEST,
            format!("Authorization failed: {}", reason),
        )
            .into_response();
    }

    let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
        state.send_error(AuthError::Listener("no code in callback".to_string()));
        return (StatusCode::BAD_REQUEST, "No code provided").into_response();
    };

    if let (Some(expected), Some(returned)) = (&state.expected_state, params.get("state")) {
        if returned.as_str() != expected.as_ref() {
            error!("State mismatch on OAuth callback");
            state.send_error(AuthError::StateMismatch);
            return (StatusCode::BAD_REQUEST, "State mismatch").into_response();
        }
    }

    info!("✅ Received authorization code via callback");
    state.send_code(code.clone());
    Html(SUCCESS_HTML).into_response()
}

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Authentication Successful</title>
</head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
<h1>Authentication successful!</h1>
<p>You can close this window and return to the terminal.</p>
</body>
</html>"#;
