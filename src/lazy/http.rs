//! HTTP transport for the lazy loader.
//!
//! Requests run through a blocking `ureq` agent on the blocking thread
//! pool, so the async side never stalls on socket I/O. There is no
//! explicit timeout: a request pends until the transport settles, and
//! stale responses are discarded by the controller's generation check.

use std::io::Read;

use async_trait::async_trait;

use super::{ContentLoader, RawResponse};
use crate::error::LoadError;

/// Loads content by treating keys as URLs and issuing GET requests.
pub struct HttpLoader {
    agent: ureq::Agent,
}

impl HttpLoader {
    pub fn new() -> Self {
        HttpLoader {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("glint/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentLoader<String> for HttpLoader {
    async fn fetch(&self, key: &String) -> Result<RawResponse, LoadError> {
        let url = key.clone();
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            tracing::trace!(%url, "fetching");
            // Non-2xx statuses surface as ureq::Error::Status here.
            let response = agent.get(&url).call().map_err(|err| LoadError::Http {
                url: url.clone(),
                message: err.to_string(),
            })?;
            let content_type = response.header("Content-Type").map(str::to_owned);
            let mut body = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut body)
                .map_err(|err| LoadError::Http {
                    url: url.clone(),
                    message: err.to_string(),
                })?;
            Ok(RawResponse { content_type, body })
        })
        .await
        .map_err(|err| LoadError::Http {
            url: key.clone(),
            message: err.to_string(),
        })?
    }
}
