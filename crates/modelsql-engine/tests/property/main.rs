//! Property tests for the result cache, parameter contracts and the
//! engine's write path.

#[path = "../common/mod.rs"]
mod common;

mod cache_props;
mod engine_props;
mod param_props;
