pub mod password;

pub use password::BcryptHasher;
