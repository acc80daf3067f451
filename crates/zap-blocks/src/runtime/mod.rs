pub mod condition;
pub mod context;
pub mod dispatcher;
pub mod interpreter;
pub mod program;
pub mod run;
pub mod scheduler;
pub mod variables;

pub use context::{QueuedEvent, RunContext};
pub use dispatcher::{Dispatcher, RunState};
pub use program::{Program, RunningScriptEntry};
pub use run::Runtime;
pub use scheduler::{Flow, Frame, Scheduler, TaskId, TaskState, Wake};
pub use variables::VariableStore;
