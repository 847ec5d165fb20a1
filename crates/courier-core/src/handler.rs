//! The handler contract and its pattern.
//!
//! A handler is a `(pattern, function)` pair. The pattern is matched against
//! the *whole* inbound text; on a match the function receives the request
//! context and the capture groups and returns a lazy stream of replies.
//!
//! ```rust,ignore
//! use courier_core::{Handler, MatchGroups, Pattern, ReplyStream, RequestContext, replies};
//!
//! struct Shout {
//!     pattern: Pattern,
//! }
//!
//! impl Handler for Shout {
//!     fn pattern(&self) -> &Pattern {
//!         &self.pattern
//!     }
//!
//!     fn handle(&self, _ctx: &RequestContext, groups: MatchGroups) -> ReplyStream {
//!         replies([groups.get(1).unwrap_or_default().to_uppercase()])
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;

use crate::context::RequestContext;
use crate::error::HandlerError;

/// The lazy, finite sequence of replies a handler produces.
///
/// An `Err` item marks the handler as failed; the executor stops polling it.
pub type ReplyStream = BoxStream<'static, Result<String, HandlerError>>;

/// Builds a [`ReplyStream`] from already-known replies.
pub fn replies<I>(items: I) -> ReplyStream
where
    I: IntoIterator,
    I::Item: Into<String>,
    I::IntoIter: Send + 'static,
{
    stream::iter(items.into_iter().map(|s| Ok(s.into()))).boxed()
}

/// An empty [`ReplyStream`].
pub fn no_replies() -> ReplyStream {
    stream::empty().boxed()
}

/// A [`ReplyStream`] that fails immediately.
pub fn fail(error: HandlerError) -> ReplyStream {
    stream::once(async move { Err(error) }).boxed()
}

// =============================================================================
// Pattern
// =============================================================================

/// A regular expression that only matches the entire input.
///
/// The source expression is wrapped as `\A(?:...)\z` at compile time, so a
/// match always spans the full text regardless of how the author anchored it.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a full-match pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(r"\A(?:{source})\z"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The expression as written by the handler author.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the capture groups if the pattern matches all of `text`.
    pub fn full_match(&self, text: &str) -> Option<MatchGroups> {
        let caps = self.regex.captures(text)?;
        let groups = caps
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        let names = self
            .regex
            .capture_names()
            .enumerate()
            .filter_map(|(i, name)| name.map(|n| (n.to_string(), i)))
            .collect();
        Some(MatchGroups { groups, names })
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Owned capture groups of a successful full match.
///
/// Group `0` is the whole text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchGroups {
    groups: Vec<Option<String>>,
    names: HashMap<String, usize>,
}

impl MatchGroups {
    /// Returns the group at `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// Returns a named group, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.names.get(name).and_then(|&i| self.get(i))
    }

    /// Number of groups including group `0`.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// =============================================================================
// Handler
// =============================================================================

/// A unit of reply logic selected by a full-text pattern.
///
/// Implementations must not keep conversation state; the only side effect a
/// handler has is the replies it yields.
pub trait Handler: Send + Sync + 'static {
    /// The pattern the whole inbound text must match.
    fn pattern(&self) -> &Pattern;

    /// Produces replies for a matching request.
    ///
    /// The matched text is `ctx.text()`, which is also group 0 of `groups`.
    ///
    /// The returned stream is polled lazily by the executor, interleaved with
    /// reply I/O, so long sequences should be produced incrementally.
    fn handle(&self, ctx: &RequestContext, groups: MatchGroups) -> ReplyStream;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A registered handler.
///
/// The executor tests [`Handler::pattern`] against the inbound text and
/// invokes [`Handler::handle`] on a match.
#[derive(Clone)]
pub struct HandlerSpec {
    handler: BoxedHandler,
}

impl HandlerSpec {
    pub fn new<H: Handler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn from_arc(handler: BoxedHandler) -> Self {
        Self { handler }
    }

    pub fn pattern(&self) -> &Pattern {
        self.handler.pattern()
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }

    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Returns the capture groups if this spec's pattern matches `text` fully.
    pub fn matches(&self, text: &str) -> Option<MatchGroups> {
        self.handler.pattern().full_match(text)
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("name", &self.name())
            .field("pattern", self.pattern())
            .finish()
    }
}
