pub mod block;
pub mod catalog;
pub mod command;
pub mod compile;
pub mod model;
pub mod value;

pub use block::{BlockDefinition, BlockKind, Category, ParamKind, ParamSpec};
pub use catalog::BlockCatalog;
pub use command::{Command, CommandList, CompiledCommand, CompiledScript, Condition, Event, Trigger};
pub use compile::{compile, compile_stack};
pub use model::{BlockInstance, ObjectProgram, Project, ScriptStack};
pub use value::{ParamMap, ParamValue};
