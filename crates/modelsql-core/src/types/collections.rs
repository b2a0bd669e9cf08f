//! Fast hash collections used on lookup-heavy paths.

pub use rustc_hash::{FxHashMap, FxHashSet};
