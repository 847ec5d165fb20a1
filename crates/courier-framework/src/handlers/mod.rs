//! Built-in handlers and the closure adapter.

mod echo;
mod ping;

pub use echo::EchoHandler;
pub use ping::PingHandler;

use courier_core::{Handler, MatchGroups, Pattern, ReplyStream, RequestContext};

/// A handler built from a pattern and a closure.
///
/// ```rust,ignore
/// let shout = handler_fn(r"(?i)shout\s+(.+)", |_ctx, groups| {
///     replies([groups.get(1).unwrap_or_default().to_uppercase()])
/// })?;
/// ```
pub struct HandlerFn<F> {
    name: String,
    pattern: Pattern,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Overrides the name used in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Creates a handler from a full-match pattern and a closure.
pub fn handler_fn<F>(pattern: &str, f: F) -> Result<HandlerFn<F>, regex::Error>
where
    F: Fn(&RequestContext, MatchGroups) -> ReplyStream + Send + Sync + 'static,
{
    Ok(HandlerFn {
        name: format!("fn({pattern})"),
        pattern: Pattern::new(pattern)?,
        f,
    })
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&RequestContext, MatchGroups) -> ReplyStream + Send + Sync + 'static,
{
    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn handle(&self, ctx: &RequestContext, groups: MatchGroups) -> ReplyStream {
        (self.f)(ctx, groups)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
