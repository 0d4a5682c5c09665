//! Card record data models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::membership::{parse_membership, StoreCollectionEntry};

/// Card record database model. The three detail fields hold free-form JSON
/// blobs and `store_collection` holds the membership list, all as TEXT.
#[derive(FromRow, Debug, Clone)]
pub struct CardDetect {
    pub id: String,
    pub user_id: String,
    pub card_name: Option<String>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    pub front_details: Option<String>,
    pub back_details: Option<String>,
    pub price_checker_details: Option<String>,
    pub is_favorite: bool,
    pub store_collection: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl CardDetect {
    /// The `name` field inside the priceCheckerDetails blob, used by the
    /// search filter and the listing visibility rule
    pub fn price_checker_name(&self) -> Option<String> {
        let raw = self.price_checker_details.as_deref()?;
        let value: Value = serde_json::from_str(raw).ok()?;
        value
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn membership(&self) -> Vec<StoreCollectionEntry> {
        parse_membership(&self.store_collection)
    }
}

/// Card record over the wire, detail blobs parsed back into JSON values
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CardDetectResponse {
    pub id: String,
    pub user_id: String,
    pub card_name: Option<String>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    pub front_details: Value,
    pub back_details: Value,
    pub price_checker_details: Value,
    pub is_favorite: bool,
    pub store_collection: Vec<StoreCollectionEntry>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<CardDetect> for CardDetectResponse {
    fn from(card: CardDetect) -> Self {
        let front_details = parse_details(card.front_details.as_deref());
        let back_details = parse_details(card.back_details.as_deref());
        let price_checker_details = parse_details(card.price_checker_details.as_deref());
        let store_collection = card.membership();

        Self {
            id: card.id,
            user_id: card.user_id,
            card_name: card.card_name,
            front_image_url: card.front_image_url,
            back_image_url: card.back_image_url,
            front_details,
            back_details,
            price_checker_details,
            is_favorite: card.is_favorite,
            store_collection,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

/// Detail blobs read as an empty object when absent or unreadable
fn parse_details(raw: Option<&str>) -> Value {
    raw.and_then(|r| serde_json::from_str(r).ok())
        .unwrap_or_else(|| serde_json::json!({}))
}

/// One page of the card listing
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CardPage {
    pub page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub limit: i64,
    pub data: Vec<CardDetectResponse>,
}

#[derive(Deserialize, Debug)]
pub struct ListCardsQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCollectionRequest {
    pub card_id: String,
    pub collection_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCollectionRequest {
    pub card_id: String,
    pub collection_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_with_price_details(raw: Option<&str>) -> CardDetect {
        CardDetect {
            id: "D_TEST01".to_string(),
            user_id: "U_TEST01".to_string(),
            card_name: None,
            front_image_url: None,
            back_image_url: None,
            front_details: None,
            back_details: None,
            price_checker_details: raw.map(str::to_string),
            is_favorite: false,
            store_collection: "[]".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_price_checker_name_extraction() {
        let card = card_with_price_details(Some(r#"{"name":"Charizard","loose-price":123}"#));
        assert_eq!(card.price_checker_name(), Some("Charizard".to_string()));

        let card = card_with_price_details(Some(r#"{"loose-price":123}"#));
        assert_eq!(card.price_checker_name(), None);

        let card = card_with_price_details(Some("not json"));
        assert_eq!(card.price_checker_name(), None);

        let card = card_with_price_details(None);
        assert_eq!(card.price_checker_name(), None);
    }

    #[test]
    fn test_response_parses_blobs_and_defaults() {
        let mut card = card_with_price_details(Some(r#"{"name":"Pikachu"}"#));
        card.front_details = Some(r#"{"hp":60}"#.to_string());
        card.store_collection = r#"[{"id":"C_ONE","name":"All"}]"#.to_string();

        let resp = CardDetectResponse::from(card);
        assert_eq!(resp.front_details["hp"], 60);
        assert_eq!(resp.price_checker_details["name"], "Pikachu");
        // Absent blob reads as an empty object
        assert_eq!(resp.back_details, serde_json::json!({}));
        assert_eq!(resp.store_collection.len(), 1);
        assert_eq!(resp.store_collection[0].id, "C_ONE");
    }
}
