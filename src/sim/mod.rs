pub mod event;
pub mod noise;
pub mod overlay;
pub mod scheduler;
pub mod session;
