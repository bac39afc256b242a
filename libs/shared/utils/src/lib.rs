pub mod test_utils;
pub mod token;

pub use token::{is_expired, is_usable, peek_claims};
