use uuid::Uuid;

/// Fresh opaque session token (122 random bits).
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}
