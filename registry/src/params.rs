// Query strings reaching us from the CRM carry platform metadata next to the
// caller's own parameters. Those keys are split off before anything else reads
// the query.
use serde::Serialize;
use std::collections::HashMap;

pub const CRM_PARAMS: [&str; 4] = ["userId", "appId", "portalId", "userEmail"];

/// Platform metadata removed from a lookup query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl CrmMetadata {
    /// The CRM always stamps a user or an app id on the requests it forwards.
    pub fn is_crm_request(&self) -> bool {
        self.user_id.as_deref().is_some_and(|v| !v.is_empty())
            || self.app_id.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Split CRM-injected keys from the caller's own parameters.
pub fn clean_crm_params(
    mut query: HashMap<String, String>,
) -> (HashMap<String, String>, CrmMetadata) {
    let metadata = CrmMetadata {
        user_id: query.remove("userId"),
        app_id: query.remove("appId"),
        portal_id: query.remove("portalId"),
        user_email: query.remove("userEmail"),
    };

    (query, metadata)
}

/// Non-empty value for `key`. Empty strings count as absent.
pub fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_crm_keys_are_removed() {
        let raw = query(&[
            ("navn", "PROPER AS"),
            ("userId", "42"),
            ("appId", "7"),
            ("portalId", "1234"),
            ("userEmail", "a@b.no"),
        ]);

        let (clean, metadata) = clean_crm_params(raw);

        assert_eq!(clean, query(&[("navn", "PROPER AS")]));
        for key in CRM_PARAMS {
            assert!(!clean.contains_key(key));
        }
        assert_eq!(metadata.portal_id.as_deref(), Some("1234"));
        assert!(metadata.is_crm_request());
    }

    #[test]
    fn test_plain_request_is_not_crm() {
        let (clean, metadata) = clean_crm_params(query(&[("portalId", "1"), ("test", "x")]));
        assert_eq!(clean.len(), 1);
        assert!(!metadata.is_crm_request());

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json, serde_json::json!({"portalId": "1"}));
    }

    #[test]
    fn test_non_empty() {
        let params = query(&[("a", ""), ("b", "x")]);
        assert_eq!(non_empty(&params, "a"), None);
        assert_eq!(non_empty(&params, "b"), Some("x"));
        assert_eq!(non_empty(&params, "c"), None);
    }
}
