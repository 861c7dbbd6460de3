//! Demo fixtures for local development and the integration tests.
//!
//! Device keys and passwords are fixed so a local curl session (or the
//! integration tests) can authenticate without extra provisioning.

use coldwatch_auth::hash_password;
use coldwatch_core::{Error, Role, UnitType, User};
use coldwatch_storage::MemoryStore;

pub(crate) async fn seed_demo(store: &MemoryStore) -> Result<(), Error> {
    let riverside = store.add_store("S01", "Riverside Market", "Portland").await;
    let lakeview = store.add_store("S02", "Lakeview Market", "Seattle").await;

    let freezer = store
        .add_unit(riverside.id, UnitType::Freezer, "Walk-in freezer", "back room")
        .await;
    let chiller = store
        .add_unit(riverside.id, UnitType::Chiller, "Dairy chiller", "aisle 4")
        .await;
    let hvac = store
        .add_unit(lakeview.id, UnitType::Hvac, "Sales floor HVAC", "roof")
        .await;

    store
        .add_device(freezer.id, "FRZ-001", "demo-key-frz-001", -25.0, -15.0)
        .await;
    store
        .add_device(chiller.id, "CHL-001", "demo-key-chl-001", 0.0, 10.0)
        .await;
    store
        .add_device(chiller.id, "CHL-002", "demo-key-chl-002", 0.0, 10.0)
        .await;
    store
        .add_device(hvac.id, "HVC-001", "demo-key-hvc-001", 16.0, 26.0)
        .await;

    store
        .add_technician("Ana Flores", "ana@coldwatch.dev", "555-0100", "north")
        .await;
    store
        .add_technician("Ben Okafor", "ben@coldwatch.dev", "555-0101", "south")
        .await;

    for (email, password, role) in [
        ("admin@coldwatch.dev", "admin-password", Role::Admin),
        ("ops@coldwatch.dev", "ops-password", Role::Operator),
    ] {
        let password_hash =
            hash_password(password).map_err(|e| Error::Internal(e.to_string()))?;
        store
            .add_user(User {
                email: email.to_string(),
                password_hash,
                role,
            })
            .await;
    }

    Ok(())
}
