pub mod activity;
pub mod forum;
pub mod iam;
pub mod notification;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub trait Entity {
    fn ident(&self) -> Uuid;
    fn version(&self) -> u32;
    fn created(&self) -> DateTime<Utc>;
    fn updated(&self) -> Option<DateTime<Utc>>;
}

/// Data used to restore a entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityData {
    pub(in crate::domain) id: Uuid,
    pub(in crate::domain) created: DateTime<Utc>,
    pub(in crate::domain) updated: Option<DateTime<Utc>>,
    pub(in crate::domain) version: u32,
}

impl EntityData {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created: Utc::now(),
            updated: None,
            version: 1,
        }
    }

    pub fn restore(
        id: Uuid,
        created: DateTime<Utc>,
        updated: Option<DateTime<Utc>>,
        version: u32,
    ) -> Self {
        Self {
            id,
            created,
            updated,
            version,
        }
    }

    /// Mark the entity as mutated.
    pub(in crate::domain) fn touch(&mut self) {
        self.updated = Some(Utc::now());
        self.version += 1;
    }
}

impl Default for EntityData {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_entity {
    ($entity:ty) => {
        impl crate::domain::entity::Entity for $entity {
            fn ident(&self) -> uuid::Uuid {
                self.data.id
            }

            fn version(&self) -> u32 {
                self.data.version
            }

            fn created(&self) -> chrono::DateTime<chrono::Utc> {
                self.data.created
            }

            fn updated(&self) -> Option<chrono::DateTime<chrono::Utc>> {
                self.data.updated
            }
        }
    };
}

macro_rules! state_ref {
    ($prop:ident, $rtrn:ty) => {
        pub fn $prop(&self) -> &$rtrn {
            &self.state.$prop
        }
    };
}

macro_rules! transform_helper {
    ($state:ty) => {
        pub fn restore(data: crate::domain::entity::EntityData, state: $state) -> Self {
            Self { data, state }
        }

        pub fn state(&self) -> &$state {
            &self.state
        }
    };
}

pub(self) use impl_entity;
pub(self) use state_ref;
pub(self) use transform_helper;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn touch_bumps_version_and_sets_updated() {
        let mut data = EntityData::new();
        assert_eq!(data.version, 1);
        assert!(data.updated.is_none());

        data.touch();
        data.touch();

        assert_eq!(data.version, 3);
        assert!(data.updated.is_some());
        assert!(data.updated.unwrap() >= data.created);
    }
}
