pub mod hook;
pub mod room;
