use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task;
use tracing::{debug, error, info, info_span, Instrument};

use crate::request::{self, Request};
use crate::resource::Resource;
use crate::router;

/// Accepts connections forever, one task per connection.
///
/// Tasks share nothing but the read-only `resource`. A failing or panicking
/// task only ends its own connection.
pub async fn serve(listener: TcpListener, resource: Arc<Resource>) {
    serve_with(listener, resource, |stream, resource| async move {
        handle_connection(stream, &resource).await
    })
    .await
}

/// Accept loop driving `handler` for every connection.
pub async fn serve_with<H, Fut>(listener: TcpListener, resource: Arc<Resource>, handler: H)
where
    H: Fn(TcpStream, Arc<Resource>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                debug!(?error, "failed to accept tcp stream.");
                continue;
            }
        };
        info!(addr = addr.to_string(), "successfully accepted new tcp stream.");

        let conn = task::spawn(
            handler(stream, Arc::clone(&resource)).instrument(info_span!("connection", %addr)),
        );
        task::spawn(async move {
            match conn.await {
                Ok(Err(error)) => debug!(?error, %addr, "connection ended with an error."),
                Err(e) if e.is_panic() => error!(%addr, "connection handler panicked."),
                _ => {}
            }
        });
    }
}

/// One read, one decode/route/encode cycle, one write, then close.
pub async fn handle_connection<S>(mut stream: S, resource: &Resource) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = request::read_message(&mut stream).await?;
    let req = Request::decode(&raw);
    info!(
        method = req.method().to_string(),
        target = req.target(),
        "successfully parsed request."
    );

    let response = router::handle(&req, resource);
    let status = response.status_code();
    response.try_write_to(&mut stream).await?;
    stream.shutdown().await?;
    info!(status, "successfully sent response");
    Ok(())
}
