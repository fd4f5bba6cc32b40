pub mod credential_service;
pub use credential_service::{AuthError, CreatedUser, CredentialService, IssuedKey};

pub mod credential_service_impl;
pub use credential_service_impl::SeaOrmCredentialService;

pub mod password;
pub use password::PasswordHasherConfig;

pub mod secret_key;

pub mod session;
pub use session::{Session, SessionState};
