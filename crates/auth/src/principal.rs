use coldwatch_core::{DeviceId, Error, Role};

/// The authenticated identity attached to a request.
///
/// Built once at the boundary and passed explicitly into every workflow
/// operation; there is no ambient or thread-local auth context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// A user email, or `device:<id>` for machine callers.
    pub subject: String,
    pub role: Role,
}

impl Principal {
    pub fn user(email: &str, role: Role) -> Self {
        Self {
            subject: email.to_string(),
            role,
        }
    }

    pub fn device(id: DeviceId) -> Self {
        Self {
            subject: format!("device:{}", id),
            role: Role::Device,
        }
    }

    pub fn is_device(&self) -> bool {
        self.role == Role::Device
    }

    /// The device id for a device principal, parsed from its subject.
    pub fn device_id(&self) -> Option<DeviceId> {
        self.subject
            .strip_prefix("device:")
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(DeviceId)
    }

    /// Telemetry ingestion is a machine capability.
    pub fn require_device(&self) -> Result<(), Error> {
        if self.is_device() {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "telemetry ingestion requires a device credential".to_string(),
            ))
        }
    }

    /// Incident and directory operations are human capabilities.
    pub fn require_human(&self) -> Result<(), Error> {
        if self.is_device() {
            Err(Error::Forbidden(
                "this operation requires a user credential".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
