//! Synchronization primitives: recursive mutexes, counting semaphores,
//! and event groups.

pub mod event;
pub mod mutex;
pub mod semaphore;

pub use event::{EventGroup, WaitMode};
pub use mutex::Mutex;
pub use semaphore::Semaphore;
