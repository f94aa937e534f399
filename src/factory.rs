//! The stream factory capability interface (§4.9 "design notes / Factory
//! callback"): the external collaborator that produces a raw typed point
//! stream given a request descriptor. Storage itself is entirely out of
//! scope (§1); the engine only ever talks to this one method.

use crate::{error::EngineError, request::RequestDescriptor, stream::BoxStream};

///
/// StreamFactory
///
/// A capability, not a base class: one method, object-safe, so tests can
/// substitute a hand-written factory yielding canned point sequences
/// (mirrors the teacher's `OrderedKeyStream`-producing test fixtures).
///

pub trait StreamFactory {
    fn create(&self, request: &RequestDescriptor) -> Result<BoxStream, EngineError>;
}
