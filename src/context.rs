//! Explicit capture context: who acted, and from which request.
//!
//! The pipeline never consults ambient globals. The framework-integration
//! layer resolves its current actor and request however it likes and hands
//! them in here, which keeps every capture call deterministic and testable.

use serde::{Deserialize, Serialize};

use crate::value::AttributeMap;

/// The principal performing an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: String,
    kind: String,
}

impl Actor {
    /// Creates an actor from its id and type (e.g. `"42"`, `"admin"`).
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// The actor's identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The actor's type.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// Ambient request metadata, captured only when policy asks for it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestInfo {
    ip: Option<String>,
    user_agent: Option<String>,
    url: Option<String>,
    method: Option<String>,
    payload: Option<AttributeMap>,
}

impl RequestInfo {
    /// Creates empty request metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client IP address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Sets the client user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the request URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Attaches the request payload.
    pub fn with_payload(mut self, payload: AttributeMap) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The client IP address, if known.
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// The client user agent, if known.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// The request URL, if known.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The HTTP method, if known.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The request payload, if attached.
    pub fn payload(&self) -> Option<&AttributeMap> {
        self.payload.as_ref()
    }
}

/// Everything the recorder needs to know about the caller's surroundings.
///
/// # Examples
///
/// ```
/// use audit_core::{Actor, CaptureContext, RequestInfo};
///
/// // A background job with no acting user:
/// let system = CaptureContext::system();
/// assert!(system.actor().is_none());
///
/// // An admin acting through a web request:
/// let ctx = CaptureContext::for_actor(Actor::new("42", "admin"))
///     .with_request(RequestInfo::new().with_ip("203.0.113.9").with_method("PUT"));
/// assert_eq!(ctx.actor().unwrap().id(), "42");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
    actor: Option<Actor>,
    request: Option<RequestInfo>,
}

impl CaptureContext {
    /// A context with no actor and no request: system-initiated work.
    pub fn system() -> Self {
        Self::default()
    }

    /// A context for the given actor.
    pub fn for_actor(actor: Actor) -> Self {
        Self {
            actor: Some(actor),
            request: None,
        }
    }

    /// Attaches request metadata.
    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    /// The acting principal, if any.
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// The originating request, if any.
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }
}
