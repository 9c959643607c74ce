pub mod command;
pub mod container;
pub mod job;
pub mod pipeline;
pub mod script;
pub mod template;
