pub mod password;
pub mod token;

pub use password::{generate_salt, CredentialStore};
pub use token::{Claims, TokenService};
