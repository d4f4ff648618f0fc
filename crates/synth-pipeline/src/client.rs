//! Outbound HTTP client shared by the publisher and the verifier.
//!
//! A thin wrapper around the hyper-util pooled client that bounds every
//! request and every body read by the configured timeout.

use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::error::TransportError;

pub(crate) const USER_AGENT: &str = "synth-image-pub-monitor/0.1";

#[derive(Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let inner = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and return the response head with its unread body.
    pub async fn send(
        &self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, TransportError> {
        match tokio::time::timeout(self.timeout, self.inner.request(req)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    /// Read a response body to the end.
    pub async fn read_body(&self, body: Incoming) -> Result<Bytes, TransportError> {
        match tokio::time::timeout(self.timeout, body.collect()).await {
            Ok(collected) => Ok(collected?.to_bytes()),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_to_closed_port_fails() {
        let client = HttpClient::new(Duration::from_millis(500));
        let req = Request::get("http://127.0.0.1:1/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let err = client.send(req).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Send(_) | TransportError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn send_times_out_on_silent_peer() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = HttpClient::new(Duration::from_millis(100));
        let req = Request::get(format!("http://{addr}/"))
            .body(Full::new(Bytes::new()))
            .unwrap();
        let err = client.send(req).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
