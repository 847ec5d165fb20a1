//! The ordered, immutable handler registry.
//!
//! Handlers are collected once at startup through [`HandlerRegistryBuilder`]
//! and frozen; the executor reads the registry concurrently without locks.

use std::sync::Arc;

use crate::handler::{Handler, HandlerSpec};

/// Ordered list of handlers, shared by every request.
///
/// Registration order is the order in which handlers are tried and in which
/// their replies are emitted.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<[HandlerSpec]>,
}

impl HandlerRegistry {
    /// Starts building a registry.
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Returns the handlers in registration order.
    pub fn handlers(&self) -> &[HandlerSpec] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Collects handlers before the registry is frozen.
#[derive(Debug, Default)]
pub struct HandlerRegistryBuilder {
    handlers: Vec<HandlerSpec>,
}

impl HandlerRegistryBuilder {
    /// Appends a handler.
    pub fn handler<H: Handler>(mut self, handler: H) -> Self {
        self.handlers.push(HandlerSpec::new(handler));
        self
    }

    /// Appends an already wrapped handler.
    pub fn spec(mut self, spec: HandlerSpec) -> Self {
        self.handlers.push(spec);
        self
    }

    /// Freezes the registry.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers.into(),
        }
    }
}

impl FromIterator<HandlerSpec> for HandlerRegistry {
    fn from_iter<T: IntoIterator<Item = HandlerSpec>>(iter: T) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}
