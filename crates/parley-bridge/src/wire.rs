// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies of the sidecar HTTP API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SendTextRequest<'a> {
    pub to: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendTextResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl SendTextResponse {
    /// The sent message id, which the sidecar reports either as a string or
    /// as `{ "_serialized": "..." }`.
    pub fn message_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Object(map) => map
                .get("_serialized")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pushname: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

impl ContactResponse {
    /// Best display name: saved name, then push name, then short name.
    pub fn display_name(self) -> Option<String> {
        [self.name, self.pushname, self.short_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfilePicResponse {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest<'a> {
    pub chat_id: &'a str,
    pub for_everyone: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_id_accepts_both_shapes() {
        let plain: SendTextResponse = serde_json::from_str(r#"{"id":"true_1@c.us_AB"}"#).unwrap();
        assert_eq!(plain.message_id().as_deref(), Some("true_1@c.us_AB"));

        let nested: SendTextResponse =
            serde_json::from_str(r#"{"id":{"_serialized":"true_1@c.us_CD"}}"#).unwrap();
        assert_eq!(nested.message_id().as_deref(), Some("true_1@c.us_CD"));

        let empty: SendTextResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.message_id(), None);
    }

    #[test]
    fn display_name_falls_back_to_pushname() {
        let contact: ContactResponse =
            serde_json::from_str(r#"{"name":"  ","pushname":"Asha"}"#).unwrap();
        assert_eq!(contact.display_name().as_deref(), Some("Asha"));
    }
}
