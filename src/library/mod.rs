pub mod logger;
pub mod scheduled_task;
pub mod state_machine;
