mod root;
mod script;

pub use root::Cli;
