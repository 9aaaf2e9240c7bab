//! Observability primitives for swarm agents.
//!
//! Executors and role loops emit [`TraceEvent`]s into whatever log or sink the host placed on the
//! agent's blackboard; nothing is recorded when neither is present.

#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    emit, NullTraceSink, TraceEvent, TraceLog, TraceSink, TracingSink, VecTraceSink, TRACE_LOG,
    TRACE_SINK,
};
