//! Price checker request models

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    pub card_id: Option<String>,
}
