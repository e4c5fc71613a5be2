pub mod arguments;
pub mod jvm;
pub mod task;

pub use arguments::{game_arguments, substitute, Placeholder, TemplateContext};
pub use task::{LaunchCommand, LaunchComposer, ProcessHandle};
