//! In-process transport.

use futures_util::future::BoxFuture;

use crate::client::{ClientError, PreparedCall, RawReply, Transport};
use crate::http::{Dispatcher, Request, Response};

/// Hands a synthesized [`Request`] to a dispatcher. The request carries the
/// same encoded path, string query pairs, headers and body the wire
/// transport would send, so routing and validation see identical input.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    dispatcher: Dispatcher,
    through_middleware: bool,
}

impl LocalTransport {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            through_middleware: false,
        }
    }

    /// Also run the matched middleware chain.
    pub fn through_middleware(mut self) -> Self {
        self.through_middleware = true;
        self
    }

    async fn dispatch(&self, request: Request) -> Response {
        let result = if self.through_middleware {
            self.dispatcher.dispatch(request).await
        } else {
            self.dispatcher.dispatch_direct(request).await
        };
        result.unwrap_or_else(|err| {
            tracing::error!(error = %err, "Unhandled handler error");
            Response::from_error(&err)
        })
    }
}

impl Transport for LocalTransport {
    fn send<'a>(&'a self, call: PreparedCall) -> BoxFuture<'a, Result<RawReply, ClientError>> {
        Box::pin(async move {
            let timeout = call.timeout;
            let request = Request {
                method: call.method,
                path: call.path,
                query: call.query,
                headers: call.headers,
                body: call.body,
                peer: None,
            };

            let response = match timeout {
                Some(limit) => tokio::time::timeout(limit, self.dispatch(request))
                    .await
                    .map_err(|_| ClientError::Timeout(limit))?,
                None => self.dispatch(request).await,
            };

            Ok(RawReply {
                status: response.status(),
                text: response.body_text(),
            })
        })
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
