use coldwatch_auth::Principal;
use coldwatch_core::{Device, Error};
use coldwatch_storage::TelemetryStore;

/// Resolve a presented device key to the device it belongs to and a device
/// principal for it.
///
/// An unknown key yields `Ok(None)`: the caller is simply not authenticated
/// by this mechanism. Only storage failures are errors.
pub async fn resolve_device_key<S: TelemetryStore>(
    store: &S,
    key: &str,
) -> Result<Option<(Device, Principal)>, Error> {
    let device = store.device_by_key(key).await?;
    Ok(device.map(|device| {
        let principal = Principal::device(device.id);
        (device, principal)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldwatch_core::{Role, UnitType};
    use coldwatch_storage::MemoryStore;

    #[tokio::test]
    async fn known_key_yields_device_principal() {
        let store = MemoryStore::new();
        let s = store.add_store("S01", "Riverside", "Portland").await;
        let unit = store
            .add_unit(s.id, UnitType::Freezer, "Freezer A", "back room")
            .await;
        let device = store.add_device(unit.id, "FRZ-001", "key-abc", -25.0, -15.0).await;

        let (resolved, principal) = resolve_device_key(&store, "key-abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, device.id);
        assert_eq!(principal.role, Role::Device);
        assert_eq!(principal.subject, format!("device:{}", device.id));
    }

    #[tokio::test]
    async fn unknown_key_is_none_not_an_error() {
        let store = MemoryStore::new();
        assert!(resolve_device_key(&store, "nope").await.unwrap().is_none());
    }
}
