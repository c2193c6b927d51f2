/// Authentication utilities
///
/// - `password`: Argon2id hashing and verification
/// - `jwt`: HS256 token creation and validation

pub mod jwt;
pub mod password;
