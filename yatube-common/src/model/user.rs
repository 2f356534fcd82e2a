use crate::model::{
    Id,
    text::{has_length, validated_text},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const USER_HANDLE_MAX_LEN: usize = 150;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// The slice of an identity-service account this model needs: something to
/// point foreign keys at, and a name to show in labels.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub handle: UserHandle,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CreateUser {
    pub handle: UserHandle,
}

fn is_valid_handle(value: &str) -> bool {
    has_length(value, USER_HANDLE_MAX_LEN)
}

validated_text!(UserHandle, InvalidUserHandleError, "user handle", is_valid_handle);

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.handle, f)
    }
}
