//! A time-series query execution engine: compiles a parsed `SELECT`
//! statement into typed point streams over a caller-supplied
//! [`factory::StreamFactory`]. Storage, the SQL-like lexer/parser, and the
//! write path are all external collaborators this crate never touches.
//!
//! The pipeline, in order: a [`factory::StreamFactory`] produces a raw
//! [`stream::PointStream`] for one measurement/field; [`demux::demux`]
//! projects tags onto the requested `GROUP BY` dimensions and merges series
//! that collapse together; [`aggregate::CallIterator`] drives the windowed
//! aggregate/selector functions; [`fill::fill`] synthesizes
//! points for windows a series never touched; [`binary_expr::BinaryExprStream`]
//! and [`derivative::DerivativeStream`] apply the remaining point-at-a-time
//! transforms. [`compile::Select`] wires all of this together from a
//! [`compile::SelectStatement`].

pub mod aggregate;
pub mod binary_expr;
pub mod compile;
pub mod context;
pub mod demux;
pub mod derivative;
pub mod error;
pub mod factory;
pub mod fill;
pub mod merge;
pub mod point;
pub mod request;
pub mod stream;
pub mod window;

pub use compile::{CompiledSelect, CompileOptions, Select, SelectStatement};
pub use context::{CancellationToken, FlagCancellationToken, NeverCancelled};
pub use error::EngineError;
pub use factory::StreamFactory;
pub use point::{Kind, Point, Tags, Value};
pub use request::{FillPolicy, RequestDescriptor};
pub use stream::{BoxStream, PointStream};
