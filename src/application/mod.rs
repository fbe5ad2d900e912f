pub mod bootstrap;
pub mod bulk_assignment;
pub mod interaction;
pub mod scheduler;
