use super::{impl_entity, state_ref, transform_helper, EntityData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState {
    pub(in crate::domain) username: String,
    pub(in crate::domain) email: String,
    pub(in crate::domain) password_hash: String,
}

impl UserState {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub(in crate::domain) data: EntityData,
    pub(in crate::domain) state: UserState,
}

impl_entity!(User);

impl User {
    state_ref!(username, String);
    state_ref!(email, String);
    state_ref!(password_hash, String);

    transform_helper!(UserState);

    pub fn new(email: String, username: String, password_hash: String) -> Self {
        Self::restore(
            EntityData::new(),
            UserState {
                email,
                username,
                password_hash,
            },
        )
    }
}
