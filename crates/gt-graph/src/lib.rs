//! `gt-graph` - deferred expression graphs evaluated inside a scoped session.
//!
//! A [`Graph`] is an explicit, append-only arena of nodes: constants,
//! placeholders, and the binary ops `matmul`, `mul` and `add`. Nothing is
//! computed while building. A [`Session`] owns a compute backend and
//! evaluates a fetched node against a [`FeedDict`] that binds every
//! reachable placeholder to a concrete tensor.

pub mod error;
pub mod feed;
pub mod graph;
pub mod node;
pub mod session;

pub use error::{GraphError, Result};
pub use feed::FeedDict;
pub use graph::Graph;
pub use node::{Node, NodeId, Op};
pub use session::Session;
