//! Table identifiers

use uuid::Uuid;

/// Length of every generated id
pub const ID_LENGTH: usize = 32;

/// Generate a fixed-length opaque id (hex form of a v4 uuid)
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
