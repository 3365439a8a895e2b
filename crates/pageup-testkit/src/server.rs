//! Local status server
//!
//! An axum server on an ephemeral port that answers each route with a fixed
//! status code. Start one per test; it shuts down when dropped.
//!
//! ## Routes
//!
//! - `GET /` and `GET /200` - 200
//! - `GET /401` - 401
//! - `GET /404` - 404
//! - `GET /500` - 500
//! - `GET /redirect` - 301 to `/`
//! - `GET /slow` - 200 after [`SLOW_DELAY`]
//!
//! Any other path answers 404.

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{MethodRouter, get},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

/// How long `/slow` waits before answering
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

type Hits = Arc<AtomicUsize>;

/// Running status server
pub struct StatusServer {
    addr: SocketAddr,
    hits: Hits,
    handle: JoinHandle<()>,
}

impl StatusServer {
    /// Bind to a free local port and start serving
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind status server");
        let addr = listener.local_addr().expect("status server address");
        let hits = Hits::default();

        let app = create_router(hits.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                debug!(error = %e, "Status server stopped");
            }
        });

        debug!(%addr, "Status server started");
        Self { addr, hits, handle }
    }

    /// Base URL, without trailing slash (e.g. `http://127.0.0.1:41234`)
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> Url {
        Url::parse(&self.base_url())
            .and_then(|base| base.join(path))
            .expect("status server url")
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn create_router(hits: Hits) -> Router {
    Router::new()
        .route("/", respond(StatusCode::OK))
        .route("/200", respond(StatusCode::OK))
        .route("/401", respond(StatusCode::UNAUTHORIZED))
        .route("/404", respond(StatusCode::NOT_FOUND))
        .route("/500", respond(StatusCode::INTERNAL_SERVER_ERROR))
        .route("/redirect", get(redirect_handler))
        .route("/slow", get(slow_handler))
        .with_state(hits)
}

/// Route answering with a fixed status
fn respond(status: StatusCode) -> MethodRouter<Hits> {
    get(move |State(hits): State<Hits>| async move {
        hits.fetch_add(1, Ordering::SeqCst);
        status
    })
}

async fn redirect_handler(State(hits): State<Hits>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/")])
}

async fn slow_handler(State(hits): State<Hits>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(SLOW_DELAY).await;
    StatusCode::OK
}

/// A local URL nothing is listening on
pub fn unreachable_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe socket");
    let port = listener.local_addr().expect("probe address").port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}/")).expect("unreachable url")
}
