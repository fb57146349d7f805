//! # Repository Implementations
//!
//! One repository per concern. The queue store currently has a single
//! concern: the deferred-mutation queue.

pub mod queue;
