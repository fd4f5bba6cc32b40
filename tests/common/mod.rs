#![allow(dead_code)]

use std::path::PathBuf;

use finledger::config::SecurityConfig;
use finledger::db::Store;
use finledger::services::SeaOrmCredentialService;

pub struct TestContext {
    pub store: Store,
    pub service: SeaOrmCredentialService,
    pub key_dir: PathBuf,
}

/// Argon2 parameters small enough to keep the suite fast.
pub fn cheap_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

pub async fn spawn_service() -> TestContext {
    let run_id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("finledger-test-{run_id}.db"));
    let key_dir = std::env::temp_dir().join(format!("finledger-test-keys-{run_id}"));

    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("Failed to open test database");

    let service = SeaOrmCredentialService::from_config(store.clone(), &cheap_security())
        .expect("Failed to build credential service");

    TestContext {
        store,
        service,
        key_dir,
    }
}
