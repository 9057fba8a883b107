//! インメモリ実装

pub mod registry;
pub mod session;

pub use registry::InMemoryRoomRegistry;
pub use session::InMemorySessionRepository;
