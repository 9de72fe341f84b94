//! Request origin extraction
//!
//! Collects what the handlers need to know about who asked and how to address
//! them back: the original request path (before nesting stripped it), the
//! `Host` used for self-referential URLs, the user agent, and the source
//! address for the download audit log.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri};
use axum::http::{HeaderMap, header, request::Parts};

use crate::config::ServerConfig;

const FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Clone)]
pub struct RequestOrigin {
    pub path: String,
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub source: Option<String>,
}

impl RequestOrigin {
    /// `{public}{prefix}`: the gateway's externally visible protocol root
    pub fn remote_base(&self, server: &ServerConfig) -> String {
        let public = match &server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.host.as_deref().unwrap_or("localhost")),
        };
        format!("{}{}", public, server.remote_prefix)
    }
}

impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let source = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string())
            .or_else(|| forwarded_for(&parts.headers));

        Ok(Self {
            path,
            host: header_text(&parts.headers, header::HOST.as_str()),
            user_agent: header_text(&parts.headers, header::USER_AGENT.as_str()),
            source,
        })
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Last hop of `X-Forwarded-For`, the one our own proxy appended
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    header_text(headers, FORWARDED_FOR)?
        .rsplit(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .map(str::to_string)
}
