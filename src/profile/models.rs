//! Profile management data models

use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub is_permanently_delete: bool,
}

/// Field values merged into the user row. `None` keeps the stored value;
/// an empty string overwrites it.
#[derive(Default, Debug)]
pub struct ProfileUpdate {
    pub fullname: Option<String>,
    pub date_of_birth: Option<String>,
    pub profile_image: Option<String>,
}
