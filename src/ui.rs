pub mod dashboard;
pub mod debug;
pub mod ranking;
pub mod state;
pub mod theme;
