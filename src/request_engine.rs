//! The request engine (C4, §4.4): forward-HTTP proxying and the
//! fully-unwrapped re-entry point C3 calls after terminating an
//! intercepted TLS tunnel.
//!
//! Both entry points converge on [`RequestEngine::process`], which never
//! synthesises an error page for the client — a failure anywhere in the
//! pipeline resolves to `None`, meaning "close the socket with nothing
//! written" (§7).

use std::io::Read as _;
use std::sync::Arc;

use flate2::read::{GzDecoder, ZlibDecoder};
use rama_http_types::{HeaderMap, HeaderValue, Method, StatusCode, Uri, Version};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::agent_pool::AgentPool;
use crate::patcher::{
    BinaryResponseArgs, Decision, Patcher, ReqId, ReqIdGen, RequestArgs, TextResponseArgs,
};
use crate::util::mime;
use crate::wire::{self, RequestHead};
use crate::{Req, Resp};

pub struct RequestEngine {
    agents: Arc<AgentPool>,
    patcher: Arc<Patcher>,
}

impl RequestEngine {
    #[must_use]
    pub fn new(agents: Arc<AgentPool>, patcher: Arc<Patcher>) -> Self {
        Self { agents, patcher }
    }

    /// Serve one forward-HTTP socket until the client closes it or a
    /// transaction asks for the connection to end. `head`/`body` are the
    /// already-read first transaction (the caller must have read far enough
    /// to tell this wasn't a `CONNECT`).
    ///
    /// Generic over the transport so the same loop drives both a plain
    /// `TcpStream` (the ordinary main listener) and a TLS stream (the main
    /// listener when `useTLS = true`, and C3's re-entry in
    /// [`crate::tls_server`]).
    pub async fn serve<S>(&self, mut stream: S, req_ids: &ReqIdGen, mut head: RequestHead, mut body: Vec<u8>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        loop {
            let keep_alive_requested = !wire::wants_close(&head.headers, head.version);
            let req_id = req_ids.next();

            match self.handle_raw(req_id, &head, body).await {
                Some(response) => {
                    let (parts, resp_body) = response.into_parts();
                    if wire::write_response_head(&mut stream, parts.status, parts.version, &parts.headers)
                        .await
                        .is_err()
                    {
                        return;
                    }
                    if stream.write_all(&resp_body).await.is_err() || stream.flush().await.is_err() {
                        return;
                    }
                }
                None => return,
            }

            if !keep_alive_requested {
                return;
            }
            head = match wire::read_request_head(&mut stream).await {
                Ok(Some(head)) => head,
                _ => return,
            };
            body = match wire::read_body(&mut stream, &head.headers, false).await {
                Ok(body) => body,
                Err(_) => return,
            };
        }
    }

    /// Entry point for a request read straight off a forward-HTTP socket:
    /// the request-target must be an absolute URI (§4.4 preconditions).
    pub async fn handle_raw(&self, req_id: ReqId, head: &RequestHead, body: Vec<u8>) -> Option<Resp> {
        let uri: Uri = head.target.parse().ok()?;
        if uri.scheme().is_none() {
            // Path-only target: guards against self-referential loops.
            return None;
        }
        self.process(req_id, head.method.clone(), uri, head.version, head.headers.clone(), body)
            .await
    }

    /// Entry point for a request C3 has already unwrapped from TLS and
    /// synthesised as `https://host/...` (§4.3).
    pub async fn handle_synthesized(&self, req_id: ReqId, request: Req) -> Option<Resp> {
        let (parts, body) = request.into_parts();
        self.process(req_id, parts.method, parts.uri, parts.version, parts.headers, body)
            .await
    }

    async fn process(
        &self,
        req_id: ReqId,
        method: Method,
        uri: Uri,
        version: Version,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Option<Resp> {
        let referer = headers
            .get(http::header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let dest_url = uri.to_string();

        let patch = self
            .patcher
            .on_request(RequestArgs {
                referer: referer.clone(),
                dest_url: dest_url.clone(),
                body,
                headers,
                req_id,
            })
            .await;

        match patch.decision {
            Decision::Deny => None,
            Decision::Empty { headers: extra } => {
                Some(self.synthesize_empty(version, &patch.headers, extra))
            }
            Decision::Redirect {
                redirect_location: None,
                redirect_text,
                headers: extra,
            } => Some(self.synthesize_text(version, redirect_text.unwrap_or_default(), extra)),
            Decision::Redirect {
                redirect_location: Some(location),
                headers: extra,
                ..
            } => {
                let new_uri: Uri = location.parse().ok()?;
                if new_uri.scheme().is_none() {
                    return None;
                }
                let mut headers = patch.headers;
                if let Some(extra) = extra {
                    for (name, value) in &extra {
                        headers.insert(name.clone(), value.clone());
                    }
                }
                self.forward(req_id, method, new_uri, version, headers, patch.body, referer, dest_url)
                    .await
            }
            Decision::Allow => {
                self.forward(req_id, method, uri, version, patch.headers, patch.body, referer, dest_url)
                    .await
            }
            Decision::Pipe => {
                crate::fatal::fatal("onRequest returned Pipe, which is only valid from onConnect", "")
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn forward(
        &self,
        req_id: ReqId,
        method: Method,
        uri: Uri,
        version: Version,
        mut headers: HeaderMap,
        body: Vec<u8>,
        referer: Option<String>,
        dest_url: String,
    ) -> Option<Resp> {
        let host = uri.host()?.to_owned();
        let use_tls = uri.scheme_str() == Some("https");
        let port = uri.port_u16().unwrap_or(if use_tls { 443 } else { 80 });
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned());

        // §4.4: force a known decompression path regardless of what the
        // client or the patcher asked for.
        headers.insert(http::header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));

        let agent = self.agents.get(version, &headers, use_tls).await;
        let mut conn = match agent.connect(&host, port).await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(%host, port, error = %err, "failed to dial upstream");
                return None;
            }
        };

        if let Err(err) = wire::write_request_head(&mut conn, &method, &target, version, &headers).await {
            tracing::warn!(%host, error = %err, "failed writing request to upstream");
            return None;
        }
        if conn.write_all(&body).await.is_err() || conn.flush().await.is_err() {
            tracing::warn!(%host, "failed writing request body to upstream");
            return None;
        }

        let head = match wire::read_response_head(&mut conn).await {
            Ok(head) => head,
            Err(err) => {
                tracing::warn!(%host, error = %err, "upstream read failed");
                return None;
            }
        };
        let resp_body = match wire::read_body(&mut conn, &head.headers, true).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%host, error = %err, "upstream aborted mid-body");
                return None;
            }
        };

        if agent.keep_alive() && !wire::wants_close(&head.headers, head.version) {
            agent.release(&host, port, conn).await;
        }

        self.finish_response(req_id, &dest_url, referer, head, resp_body).await
    }

    async fn finish_response(
        &self,
        req_id: ReqId,
        dest_url: &str,
        referer: Option<String>,
        head: wire::ResponseHead,
        body: Vec<u8>,
    ) -> Option<Resp> {
        let mut headers = head.headers;
        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();

        let body = if is_textual(&content_type) {
            let encoding = headers
                .get(http::header::CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("identity")
                .to_ascii_lowercase();
            let decoded = match decode_body(&body, &encoding) {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::warn!(dest_url, error = %err, "failed to decode upstream body");
                    return None;
                }
            };
            let text = String::from_utf8_lossy(&decoded).into_owned();
            let patched = self
                .patcher
                .on_text_response(TextResponseArgs {
                    referer,
                    dest_url: dest_url.to_owned(),
                    text,
                    headers: headers.clone(),
                    req_id,
                })
                .await;
            headers.insert(http::header::CONTENT_ENCODING, HeaderValue::from_static("identity"));
            patched.into_bytes()
        } else {
            self.patcher
                .on_other_response(BinaryResponseArgs {
                    referer,
                    dest_url: dest_url.to_owned(),
                    bytes: body,
                    headers: headers.clone(),
                    req_id,
                })
                .await
        };

        Some(finalize(head.status, head.version, headers, body))
    }

    fn synthesize_empty(&self, version: Version, headers: &HeaderMap, extra: Option<HeaderMap>) -> Resp {
        let accept = headers
            .get(http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let mut resp_headers = HeaderMap::new();
        resp_headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_str(mime::extract(accept)).unwrap_or(HeaderValue::from_static("text/html")),
        );
        resp_headers.insert(http::header::SERVER, HeaderValue::from_static("Apache/2.4.7 (Ubuntu)"));
        if let Some(extra) = extra {
            for (name, value) in &extra {
                resp_headers.insert(name.clone(), value.clone());
            }
        }
        finalize(StatusCode::OK, version, resp_headers, Vec::new())
    }

    fn synthesize_text(&self, version: Version, text: Vec<u8>, extra: Option<HeaderMap>) -> Resp {
        let mut headers = HeaderMap::new();
        if let Some(extra) = extra {
            for (name, value) in &extra {
                headers.insert(name.clone(), value.clone());
            }
        }
        finalize(StatusCode::OK, version, headers, text)
    }
}

/// §4.4: "a comma-or-semicolon-separated header value"'s first concrete
/// textual kind — `text/*`, `*/xhtml+xml`, `*/xml`.
fn is_textual(content_type: &str) -> bool {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    base.starts_with("text/") || base.ends_with("/xhtml+xml") || base.ends_with("/xml")
}

fn decode_body(body: &[u8], encoding: &str) -> std::io::Result<Vec<u8>> {
    match encoding {
        "gzip" | "x-gzip" => {
            let mut out = Vec::new();
            GzDecoder::new(body).read_to_end(&mut out)?;
            Ok(out)
        }
        "deflate" => {
            let mut out = Vec::new();
            ZlibDecoder::new(body).read_to_end(&mut out)?;
            Ok(out)
        }
        _ => Ok(body.to_vec()),
    }
}

/// Every emitted response goes through here: `Content-Length` is recomputed
/// from the final payload and `Public-Key-Pins` is unconditionally stripped
/// (§4.4 step 6, §8 property 8).
fn finalize(status: StatusCode, version: Version, mut headers: HeaderMap, body: Vec<u8>) -> Resp {
    headers.remove("public-key-pins");
    headers.insert(
        http::header::CONTENT_LENGTH,
        HeaderValue::from_str(&body.len().to_string()).unwrap_or(HeaderValue::from_static("0")),
    );
    let mut builder = rama_http_types::Response::builder().status(status).version(version);
    if let Some(h) = builder.headers_mut() {
        *h = headers;
    }
    builder
        .body(body)
        .unwrap_or_else(|_| rama_http_types::Response::new(Vec::new()))
}
