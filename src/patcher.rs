//! The patcher surface (C6): four externally-settable hooks plus the closed
//! `Decision` enum they communicate through (§4.6).
//!
//! A patcher may answer synchronously or after awaiting I/O — the engine
//! must not assume either, so every hook returns a boxed future rather than
//! a bare value.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use rama_http_types::HeaderMap;

/// A boxed, `'static`, `Send` future, the shape every patcher hook returns.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Monotonically increasing, process-unique identifier handed to every
/// patcher invocation (§4.6: "unique per process; CONNECT and its
/// subsequent REQUEST transactions carry distinct ids").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReqId(u64);

impl std::fmt::Display for ReqId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generator for [`ReqId`] values, one per `Engine`.
#[derive(Debug, Default)]
pub struct ReqIdGen(AtomicU64);

impl ReqIdGen {
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Allocate the next id. Wraps only after `u64::MAX` transactions.
    pub fn next(&self) -> ReqId {
        ReqId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// The closed decision set of §4.6. Not every variant is valid from every
/// hook; an invalid combination is a `PatcherMisuse` and is fatal (§7).
#[derive(Debug, Clone)]
pub enum Decision {
    /// Continue normally. Valid from `onRequest` and `onConnect`.
    Allow,
    /// Respond `200` with an empty body. Valid from `onRequest` only.
    Empty { headers: Option<HeaderMap> },
    /// Close the connection without a response. Valid from `onRequest` and
    /// `onConnect`.
    Deny,
    /// Either synthesise `redirect_text` directly (`redirect_location =
    /// None`) or forward to `redirect_location` instead of the original
    /// destination. Valid from `onRequest` only. The user agent never sees
    /// an HTTP redirect status either way.
    Redirect {
        redirect_location: Option<String>,
        redirect_text: Option<Vec<u8>>,
        headers: Option<HeaderMap>,
    },
    /// Raw TCP splice with no further inspection. Valid from `onConnect`
    /// only.
    Pipe,
}

/// Arguments and result of an `onRequest` invocation.
pub struct RequestArgs {
    pub referer: Option<String>,
    pub dest_url: String,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
    pub req_id: ReqId,
}

pub struct RequestPatch {
    pub decision: Decision,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Arguments of an `onConnect` invocation.
pub struct ConnectArgs {
    pub dest_host_port: String,
    pub req_id: ReqId,
}

/// Arguments of an `onTextResponse` invocation; the body has already been
/// decoded to text by the request engine.
pub struct TextResponseArgs {
    pub referer: Option<String>,
    pub dest_url: String,
    pub text: String,
    pub headers: HeaderMap,
    pub req_id: ReqId,
}

/// Arguments of an `onOtherResponse` invocation; the body is passed through
/// still in whatever `Content-Encoding` the origin used.
pub struct BinaryResponseArgs {
    pub referer: Option<String>,
    pub dest_url: String,
    pub bytes: Vec<u8>,
    pub headers: HeaderMap,
    pub req_id: ReqId,
}

type OnRequestHook = Box<dyn Fn(RequestArgs) -> BoxFuture<RequestPatch> + Send + Sync>;
type OnConnectHook = Box<dyn Fn(ConnectArgs) -> BoxFuture<Decision> + Send + Sync>;
type OnTextResponseHook = Box<dyn Fn(TextResponseArgs) -> BoxFuture<String> + Send + Sync>;
type OnOtherResponseHook = Box<dyn Fn(BinaryResponseArgs) -> BoxFuture<Vec<u8>> + Send + Sync>;

/// The four-hook patcher pipeline. Construct with [`Patcher::new`] to get
/// the default behaviour described in §8 scenario S1 (a script tag injected
/// into textual responses, everything else allowed through), then override
/// individual hooks.
pub struct Patcher {
    on_request: OnRequestHook,
    on_connect: OnConnectHook,
    on_text_response: OnTextResponseHook,
    on_other_response: OnOtherResponseHook,
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Patcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_request: Box::new(|args| Box::pin(async move { default_on_request(args) })),
            on_connect: Box::new(|_args| Box::pin(async { Decision::Allow })),
            on_text_response: Box::new(|args| Box::pin(async move { default_on_text_response(args) })),
            on_other_response: Box::new(|args| Box::pin(async move { args.bytes })),
        }
    }

    /// Override the `onRequest` hook.
    #[must_use]
    pub fn with_on_request<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(RequestArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RequestPatch> + Send + 'static,
    {
        self.on_request = Box::new(move |args| Box::pin(hook(args)));
        self
    }

    /// Override the `onConnect` hook.
    #[must_use]
    pub fn with_on_connect<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ConnectArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Decision> + Send + 'static,
    {
        self.on_connect = Box::new(move |args| Box::pin(hook(args)));
        self
    }

    /// Override the `onTextResponse` hook.
    #[must_use]
    pub fn with_on_text_response<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(TextResponseArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        self.on_text_response = Box::new(move |args| Box::pin(hook(args)));
        self
    }

    /// Override the `onOtherResponse` hook.
    #[must_use]
    pub fn with_on_other_response<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(BinaryResponseArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<u8>> + Send + 'static,
    {
        self.on_other_response = Box::new(move |args| Box::pin(hook(args)));
        self
    }

    pub async fn on_request(&self, args: RequestArgs) -> RequestPatch {
        (self.on_request)(args).await
    }

    pub async fn on_connect(&self, args: ConnectArgs) -> Decision {
        (self.on_connect)(args).await
    }

    pub async fn on_text_response(&self, args: TextResponseArgs) -> String {
        (self.on_text_response)(args).await
    }

    pub async fn on_other_response(&self, args: BinaryResponseArgs) -> Vec<u8> {
        (self.on_other_response)(args).await
    }
}

fn default_on_request(args: RequestArgs) -> RequestPatch {
    RequestPatch {
        decision: Decision::Allow,
        body: args.body,
        headers: args.headers,
    }
}

/// The stock greeting script, injected immediately after the first
/// `<head>` tag in a textual response (§8 S1).
const GREETING_SCRIPT: &str = "<script>console.log(\"Hello from Violentproxy :)\");</script>";

fn default_on_text_response(args: TextResponseArgs) -> String {
    inject_after_head(&args.text, GREETING_SCRIPT)
}

/// Insert `snippet` immediately after the first case-insensitive `<head>`
/// tag in `text`, or return `text` unchanged if no such tag is present.
fn inject_after_head(text: &str, snippet: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let Some(tag_start) = lower.find("<head") else {
        return text.to_owned();
    };
    let Some(tag_end_offset) = lower[tag_start..].find('>') else {
        return text.to_owned();
    };
    let insert_at = tag_start + tag_end_offset + 1;
    let mut patched = String::with_capacity(text.len() + snippet.len());
    patched.push_str(&text[..insert_at]);
    patched.push_str(snippet);
    patched.push_str(&text[insert_at..]);
    patched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn req_id_gen_is_monotonic_and_unique() {
        let gen = ReqIdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn injects_greeting_script_after_head() {
        let patched = inject_after_head("<head></head>", GREETING_SCRIPT);
        assert_eq!(
            patched,
            "<head><script>console.log(\"Hello from Violentproxy :)\");</script></head>"
        );
        assert_eq!(patched.len(), 63);
    }

    #[test]
    fn leaves_text_without_head_tag_unchanged() {
        let text = "plain text, no markup";
        assert_eq!(inject_after_head(text, GREETING_SCRIPT), text);
    }

    #[tokio::test]
    async fn default_patcher_allows_requests_unchanged() {
        let patcher = Patcher::new();
        let args = RequestArgs {
            referer: None,
            dest_url: "http://example.org/".to_owned(),
            body: b"payload".to_vec(),
            headers: HeaderMap::new(),
            req_id: ReqIdGen::new().next(),
        };
        let patch = patcher.on_request(args).await;
        assert!(matches!(patch.decision, Decision::Allow));
        assert_eq!(patch.body, b"payload");
    }

    #[tokio::test]
    async fn default_patcher_allows_connect() {
        let patcher = Patcher::new();
        let decision = patcher
            .on_connect(ConnectArgs {
                dest_host_port: "example.org:443".to_owned(),
                req_id: ReqIdGen::new().next(),
            })
            .await;
        assert!(matches!(decision, Decision::Allow));
    }
}
