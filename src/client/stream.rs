//! The asynchronous result sequence returned by every verb
//!
//! A request yields zero, one or two `Ok` emissions. The stream then either
//! ends (completion) or yields exactly one `Err` and ends.

use crate::error::{RestifyError, RestifyResult};
use crate::response::Response;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Where an emitted response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Cache,
    Network,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Cache => write!(f, "cache"),
            Origin::Network => write!(f, "network"),
        }
    }
}

/// One response delivered to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub origin: Origin,
    pub response: Response,
}

impl Emission {
    pub fn new(origin: Origin, response: Response) -> Self {
        Self { origin, response }
    }
}

/// Everything a request produced, gathered after completion
#[derive(Debug)]
pub struct RequestOutcome {
    pub emissions: Vec<Emission>,
    pub error: Option<RestifyError>,
}

impl RequestOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The most recent payload the caller saw
    pub fn latest(&self) -> Option<&Response> {
        self.emissions.last().map(|e| &e.response)
    }
}

/// Lazy stream of emissions for one request
pub struct RequestStream {
    inner: BoxStream<'static, RestifyResult<Emission>>,
}

impl RequestStream {
    pub(crate) fn new(inner: BoxStream<'static, RestifyResult<Emission>>) -> Self {
        Self { inner }
    }

    /// Drive the request to completion and gather every signal
    pub async fn collect_all(mut self) -> RequestOutcome {
        let mut emissions = Vec::new();
        let mut error = None;

        while let Some(item) = self.inner.next().await {
            match item {
                Ok(emission) => emissions.push(emission),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        RequestOutcome { emissions, error }
    }

    /// Deserialize every emitted payload into `T`
    pub fn typed<T>(self) -> BoxStream<'static, RestifyResult<(Origin, T)>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner
            .map(|item| {
                let emission = item?;
                let value = emission.response.data_as::<T>()?;
                Ok((emission.origin, value))
            })
            .boxed()
    }
}

impl Stream for RequestStream {
    type Item = RestifyResult<Emission>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
