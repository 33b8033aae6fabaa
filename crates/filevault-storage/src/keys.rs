//! Shared key generation for storage backends.
//!
//! Key format: `{user_id}/{file_id}{extension}`.

use uuid::Uuid;

/// Generate the storage key for a user's file.
///
/// The extension must include its leading dot (or be empty for files without
/// one). All backends use this format so keys never need to be parsed back.
pub fn object_key(user_id: Uuid, file_id: Uuid, extension: &str) -> String {
    format!("{}/{}{}", user_id, file_id, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_format() {
        let user_id = Uuid::nil();
        let file_id = Uuid::max();
        assert_eq!(
            object_key(user_id, file_id, ".png"),
            format!("{}/{}.png", user_id, file_id)
        );
    }

    #[test]
    fn test_object_key_without_extension() {
        let user_id = Uuid::new_v4();
        let file_id = Uuid::new_v4();
        assert_eq!(
            object_key(user_id, file_id, ""),
            format!("{}/{}", user_id, file_id)
        );
    }
}
