pub mod contact;

pub use contact::{ContactPayload, ValidContact};
