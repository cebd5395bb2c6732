use std::fmt::{Debug, Display};
use std::hash::Hash;

use uuid::Uuid;

/// Behaviour shared by every typed entity identifier.
///
/// Each aggregate gets its own UUID newtype so a `PartId` can never be
/// passed where a `PartCategoryId` is expected.
pub trait EntityId:
    Copy + Eq + Ord + Hash + Debug + Display + From<Uuid> + Send + Sync + 'static
{
    /// Returns the underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl EntityId for $name {
            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Identifier of a customer.
    CustomerId
);
entity_id!(
    /// Identifier of a registered vehicle.
    VehicleId
);
entity_id!(
    /// Identifier of a vehicle model (brand, model name, year).
    VehicleModelId
);
entity_id!(
    /// Identifier of a physical part.
    PartId
);
entity_id!(
    /// Identifier of a part category.
    PartCategoryId
);
entity_id!(
    /// Identifier of a warranty policy.
    WarrantyPolicyId
);
entity_id!(
    /// Identifier of a policy coverage entry.
    CoverageId
);
entity_id!(
    /// Identifier of a work order.
    WorkOrderId
);
entity_id!(
    /// Identifier of a warranty claim owned by the claims service.
    ClaimId
);
entity_id!(
    /// Identifier of a technician owned by the claims service.
    TechnicianId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        let id1 = CustomerId::new();
        let id2 = CustomerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = PartId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn serializes_as_plain_uuid_string() {
        let uuid = Uuid::new_v4();
        let id = VehicleId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn parses_from_str() {
        let uuid = Uuid::new_v4();
        let id: WorkOrderId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<WorkOrderId>().is_err());
    }
}
