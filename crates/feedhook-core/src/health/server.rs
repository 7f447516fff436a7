use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::Result;

pub const HEALTH_PATH: &str = "/healthz";
const HEALTH_BODY: &str = "OK.";

/// HTTP server exposing the liveness probe
pub struct HealthServer {
    addr: String,
    last_link: watch::Receiver<String>,
}

impl HealthServer {
    pub fn new(addr: impl Into<String>, last_link: watch::Receiver<String>) -> Self {
        Self {
            addr: addr.into(),
            last_link,
        }
    }

    /// Bind the listen address
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.addr.as_str()).await?;
        info!("Health endpoint listening on http://{}{}", listener.local_addr()?, HEALTH_PATH);
        Ok(listener)
    }

    /// Bind and serve until the shutdown signal
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal
    pub async fn serve(&self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let app = router(self.last_link.clone());

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    let stop = *shutdown.borrow();
                    if stop {
                        break;
                    }
                }
            })
            .await?;

        info!("Health endpoint stopped");
        Ok(())
    }
}

/// Routes of the health endpoint
pub fn router(last_link: watch::Receiver<String>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(healthz))
        .with_state(last_link)
}

async fn healthz(State(last_link): State<watch::Receiver<String>>) -> &'static str {
    let current = last_link.borrow().clone();
    debug!(last_link = %current, "Health check");
    HEALTH_BODY
}
