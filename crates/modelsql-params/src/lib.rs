//! # modelsql-params
//!
//! Everything that happens to caller parameters before SQL runs:
//!
//! - `param_spec`: declared parameter contracts (type, bounds, default kind)
//! - `validate`: per-value contract checks
//! - `defaults`: default synthesis and the validate-or-default pass over a command
//! - `named`: process-wide name → constant/function table for custom defaults
//! - `idgen`: time-ordered 64-bit unique ids

pub mod defaults;
pub mod idgen;
pub mod named;
pub mod param_spec;
pub mod validate;

pub use defaults::resolve_params;
pub use idgen::IdGenerator;
pub use named::{register_named_value, NamedValue, NamedValues};
pub use param_spec::{DefaultKind, ParamSpec, ParamType};
