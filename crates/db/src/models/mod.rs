pub mod capture;
pub mod room;
