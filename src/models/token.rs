use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "access_token")]
    pub token: String,
    #[serde(rename = "refresh_token")]
    pub refresh: String,
}
