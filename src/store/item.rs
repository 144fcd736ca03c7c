// Gallery record types

use serde::{Deserialize, Serialize};

/// A single gallery record as stored and returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub detail: String,
}

/// Client-supplied fields for create and update
///
/// Any `id` in the body is ignored; missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GalleryPayload {
    pub name: String,
    pub image: String,
    pub detail: String,
}

impl GalleryPayload {
    pub fn new(name: &str, image: &str, detail: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn into_item(self, id: i64) -> GalleryItem {
        GalleryItem {
            id,
            name: self.name,
            image: self.image,
            detail: self.detail,
        }
    }
}

/// Records every fresh process starts with
pub fn seed_items() -> Vec<GalleryItem> {
    vec![
        GalleryPayload::new(
            "Mochizuki Honami",
            "/images/Honami_wedding.png",
            "Mochizuki Honami Wedding Dress Ver.",
        )
        .into_item(1),
        GalleryPayload::new("RX-78-2 Gundam", "/images/gundam.png", "HG 1/144").into_item(2),
        GalleryPayload::new(
            "Usio Noa",
            "/images/Usio_Noa_Nendoroid.jpg",
            "Nendoroid Usio Noa",
        )
        .into_item(3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_ignores_client_id() {
        let payload: GalleryPayload =
            serde_json::from_str(r#"{"id":99,"name":"X","image":"/images/x.png","detail":"d"}"#)
                .unwrap();
        assert_eq!(payload, GalleryPayload::new("X", "/images/x.png", "d"));
    }

    #[test]
    fn test_payload_missing_fields_are_empty() {
        let payload: GalleryPayload = serde_json::from_str(r#"{"name":"only"}"#).unwrap();
        assert_eq!(payload.name, "only");
        assert!(payload.image.is_empty());
        assert!(payload.detail.is_empty());
    }

    #[test]
    fn test_item_wire_format() {
        let item = GalleryPayload::new("X", "/images/x.png", "d").into_item(4);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 4, "name": "X", "image": "/images/x.png", "detail": "d"})
        );
    }

    #[test]
    fn test_seed_ids() {
        let ids: Vec<i64> = seed_items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
