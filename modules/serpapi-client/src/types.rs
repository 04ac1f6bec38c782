use serde::{Deserialize, Deserializer};

/// Response envelope for `engine=google_maps`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapsResponse {
    #[serde(default)]
    pub local_results: Vec<LocalResult>,
    /// SerpApi reports quota and query problems here with a 200 status.
    pub error: Option<String>,
}

/// A single business listing from Google Maps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalResult {
    #[serde(default)]
    pub title: String,
    pub place_id: Option<String>,
    pub data_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub business_type: Option<String>,
    pub description: Option<String>,
}

impl LocalResult {
    /// Stable identifier for dedup: `place_id`, then `data_id`, then
    /// title + address.
    pub fn stable_id(&self) -> String {
        self.place_id
            .clone()
            .or_else(|| self.data_id.clone())
            .unwrap_or_else(|| {
                format!(
                    "{}|{}",
                    self.title,
                    self.address.as_deref().unwrap_or_default()
                )
            })
    }

    /// True when a non-blank website is listed.
    pub fn has_website(&self) -> bool {
        self.website
            .as_deref()
            .is_some_and(|w| !w.trim().is_empty())
    }
}

/// Ratings normally arrive as numbers but occasionally as strings.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_results() {
        let raw = r#"{
            "local_results": [
                {"title": "Apex Roofing", "place_id": "abc", "rating": 4.7, "phone": "(713) 555-0100", "address": "1 Main St, Houston, TX 77002"},
                {"title": "Sky Roofers", "data_id": "0x1", "rating": "4.1", "website": "https://sky.example"}
            ]
        }"#;
        let response: MapsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.local_results.len(), 2);
        assert_eq!(response.local_results[0].rating, Some(4.7));
        assert_eq!(response.local_results[1].rating, Some(4.1));
        assert!(response.local_results[1].has_website());
        assert!(!response.local_results[0].has_website());
    }

    #[test]
    fn stable_id_falls_back_in_order() {
        let with_place = LocalResult {
            title: "A".into(),
            place_id: Some("p".into()),
            data_id: Some("d".into()),
            ..Default::default()
        };
        assert_eq!(with_place.stable_id(), "p");

        let with_data = LocalResult {
            title: "A".into(),
            data_id: Some("d".into()),
            ..Default::default()
        };
        assert_eq!(with_data.stable_id(), "d");

        let bare = LocalResult {
            title: "A".into(),
            address: Some("1 Main St".into()),
            ..Default::default()
        };
        assert_eq!(bare.stable_id(), "A|1 Main St");
    }

    #[test]
    fn missing_results_default_to_empty() {
        let response: MapsResponse =
            serde_json::from_str(r#"{"error": "Invalid API key."}"#).unwrap();
        assert!(response.local_results.is_empty());
        assert_eq!(response.error.as_deref(), Some("Invalid API key."));
    }
}
