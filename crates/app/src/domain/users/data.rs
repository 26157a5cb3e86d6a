//! User Data

use crate::domain::users::records::{Role, UserUuid};

/// New User Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// UUID to assign to the profile.
    pub uuid: UserUuid,

    /// Display name; the email's local part is used when blank.
    pub name: String,

    /// Contact email.
    pub email: String,

    /// Requested role; renters by default.
    pub role: Option<Role>,

    /// Optional avatar image URL.
    pub avatar: Option<String>,
}
