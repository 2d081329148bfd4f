pub mod capture_repo;
pub mod room_repo;

pub use capture_repo::CaptureRepo;
pub use room_repo::RoomRepo;
