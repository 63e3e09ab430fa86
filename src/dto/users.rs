use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

/// Body for both PUT and PATCH on a user.
///
/// PUT requires `username`, `email`, `first_name` and `last_name` and resets
/// `birth_date`/`photo` to whatever was sent. PATCH only touches the fields
/// that are present; an explicit `null` clears `birth_date` or `photo`. `password` is optional in both and is stored hashed.
/// `is_staff` and `disabled` may only be sent by staff.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>)]
    pub photo: Option<Option<String>>,
    pub is_staff: Option<bool>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_null_differs_from_missing() {
        let missing: UpdateUserRequest = serde_json::from_str(r#"{"first_name":"A"}"#).unwrap();
        assert_eq!(missing.birth_date, None);
        assert_eq!(missing.photo, None);

        let cleared: UpdateUserRequest =
            serde_json::from_str(r#"{"birth_date":null,"photo":null}"#).unwrap();
        assert_eq!(cleared.birth_date, Some(None));
        assert_eq!(cleared.photo, Some(None));

        let set: UpdateUserRequest =
            serde_json::from_str(r#"{"birth_date":"1990-05-17"}"#).unwrap();
        assert_eq!(
            set.birth_date,
            Some(NaiveDate::from_ymd_opt(1990, 5, 17))
        );
    }
}
