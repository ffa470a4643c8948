pub mod agent;
pub mod event;
pub mod location;
pub mod order;
