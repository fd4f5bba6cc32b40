pub mod bootstrap {

    pub const ADMIN_USERNAME: &str = "admin";

    /// Well-known initial password for the bootstrap admin. Operators are
    /// expected to change it after first login.
    pub const ADMIN_DEFAULT_PASSWORD: &str = "admin123";
}

pub mod secret_key {

    /// Bytes of randomness per key; hex encoding doubles the length.
    pub const RANDOM_BYTES: usize = 16;

    pub const ENCODED_LEN: usize = RANDOM_BYTES * 2;

    pub const KEY_FILE_EXTENSION: &str = "key";

    /// Hex characters of randomness in a staged key file's name.
    pub const STAGING_TAG_LEN: usize = 8;
}

pub mod password {

    pub const SALT_BYTES: usize = 16;

    /// Hash prefixes written by the earlier bcrypt-based ledger app.
    pub const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];
}

pub mod db {
    use std::time::Duration;

    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
}
