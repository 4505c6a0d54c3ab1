use crate::Result;
use core::future::Future;
use serde_json::Value;

/// HTTP verb for a batched write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMethod {
    Post,
    Put,
}

/// The network seam used by the [`Scheduler`](crate::Scheduler).
///
/// Paths are relative to the API root (`/state`, `/unselected`, ...). Bodies
/// travel as untyped JSON; decoding into wire types happens one layer up so a
/// single response can be shared by several coalesced callers.
pub trait Transport: Send + Sync + 'static {
    /// Issues a `GET` with the given query pairs.
    fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Issues a `POST`/`PUT` with a JSON body.
    fn send(
        &self,
        method: WriteMethod,
        path: &str,
        body: Value,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// [`Transport`] over HTTP using `reqwest`.
///
/// Relies on the underlying client's own timeout behavior; no extra deadline
/// is applied.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url` (trailing slashes ignored).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the HTTP client
    /// cannot be initialized.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    async fn send(&self, method: WriteMethod, path: &str, body: Value) -> Result<Value> {
        let request = match method {
            WriteMethod::Post => self.client.post(self.url(path)),
            WriteMethod::Put => self.client.put(self.url(path)),
        };
        let response = request.json(&body).send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}
