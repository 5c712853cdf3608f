pub mod event;
pub mod setup;
pub mod signal;
pub mod turn;
