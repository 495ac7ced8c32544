use serde::{Deserialize, Serialize};

use staybook_core::HostId;

/// Host sub-document embedded in each listing the host owns.
///
/// Copies of the same host live in several listings; reads take the first
/// listing (by id) that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub host_id: HostId,
    pub host_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_picture_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_is_superhost: Option<bool>,
}

impl Host {
    pub fn new(host_id: HostId, host_name: impl Into<String>) -> Self {
        Self {
            host_id,
            host_name: host_name.into(),
            host_location: None,
            host_about: None,
            host_picture_url: None,
            host_is_superhost: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_default_and_are_omitted() {
        let host: Host = serde_json::from_value(json!({
            "host_id": "h1",
            "host_name": "Maya"
        }))
        .unwrap();
        assert_eq!(host, Host::new(HostId::parse("h1").unwrap(), "Maya"));
        assert_eq!(
            serde_json::to_value(&host).unwrap(),
            json!({"host_id": "h1", "host_name": "Maya"})
        );
    }

    #[test]
    fn blank_host_id_does_not_deserialize() {
        let err = serde_json::from_value::<Host>(json!({"host_id": " ", "host_name": "Maya"}));
        assert!(err.is_err());
    }
}
