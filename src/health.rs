use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SERVICE_NAME: &str = "geofactbot";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to bind health endpoint port")]
    Bind(#[source] std::io::Error),
    #[error("health endpoint stopped serving")]
    Serve(#[source] std::io::Error),
}

/// Bound but not yet serving health endpoint. Binding is split from serving
/// so that a busy port aborts startup before the bot connects.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub fn port(&self) -> std::io::Result<u16> {
        self.listener.local_addr().map(|addr| addr.port())
    }

    pub async fn serve(self) -> Result<(), Error> {
        axum::serve(self.listener, router()).await.map_err(Error::Serve)
    }
}

pub async fn bind(port: u16) -> Result<Server, Error> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(Error::Bind)?;

    log::info!("health endpoint listening on port {port}");

    Ok(Server { listener })
}

pub fn router() -> Router {
    Router::new().route("/health", get(health)).route("/", get(root))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
    }))
}
