//! Network transport.

use futures_util::future::BoxFuture;
use url::Url;

use crate::client::{ClientError, PreparedCall, RawReply, Transport};

#[derive(Debug, Clone)]
pub struct WireTransport {
    http: reqwest::Client,
    base: Url,
}

impl WireTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(base_url)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Base URL with the call's path appended to any base prefix.
    pub fn url_for(&self, call: &PreparedCall) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{}", call.path));
        url.set_query(None);
        if !call.query.is_empty() {
            url.query_pairs_mut().extend_pairs(call.query.iter());
        }
        url
    }
}

impl Transport for WireTransport {
    fn send<'a>(&'a self, call: PreparedCall) -> BoxFuture<'a, Result<RawReply, ClientError>> {
        Box::pin(async move {
            let url = self.url_for(&call);
            let mut request = self
                .http
                .request(call.method.to_http(), url)
                .headers(call.headers);
            if let Some(body) = &call.body {
                request = request.json(body);
            }
            if let Some(timeout) = call.timeout {
                request = request.timeout(timeout);
            }

            let response = request.send().await.map_err(|err| match call.timeout {
                Some(timeout) if err.is_timeout() => ClientError::Timeout(timeout),
                _ => ClientError::Transport(err),
            })?;
            let status = response.status();
            let text = response.text().await?;
            Ok(RawReply { status, text })
        })
    }

    fn kind(&self) -> &'static str {
        "wire"
    }
}
