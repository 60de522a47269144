pub mod history;
pub mod rooms;
pub mod send;
pub mod state;
pub mod uploads;
