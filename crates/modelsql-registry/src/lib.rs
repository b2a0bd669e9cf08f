//! # modelsql-registry
//!
//! Loads model definition documents from configured roots and keeps them
//! current.
//!
//! - `definition`: immutable model, command group and command types
//! - `parser`: XML definition document → [`Document`]
//! - `cache`: content-hash keyed parse cache
//! - `scanner`: definition file discovery
//! - `registry`: RW-locked snapshot with load/find/refresh/remove/reload
//! - `watcher`: polling change detection feeding the registry over a channel

pub mod cache;
pub mod definition;
pub mod events;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod watcher;

pub use definition::{Command, CommandGroup, Document, GroupType, Model};
pub use events::RegistryEventHandler;
pub use registry::{ModelRegistry, RegistryStats, ResolvedGroup};
pub use watcher::Watcher;
