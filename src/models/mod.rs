//! Data models for StuffLibrary

pub mod borrow_request;
pub mod enums;
pub mod item;
pub mod user;

// Re-export commonly used types
pub use borrow_request::{BorrowRequest, BorrowRequestDetails, CreateBorrowRequest};
pub use enums::{BorrowAction, BorrowStatus};
pub use item::{Item, ItemShort};
pub use user::{User, UserShort};
