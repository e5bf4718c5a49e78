//! Helpers shared by tests that talk to hosted services over HTTP.

/// Serves `app` on an ephemeral local port and returns its base URL.
pub(crate) async fn spawn_stub(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
