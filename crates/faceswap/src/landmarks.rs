use serde::Deserialize;

/// Shapes the detector has been seen to return for `landmarks_str`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawLandmarks {
    Token(String),
    List(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

impl RawLandmarks {
    /// Collapse the detector output to the single token the swap endpoints take
    ///
    /// A list contributes its first element, which must itself be a string.
    pub(crate) fn normalize(self) -> Option<String> {
        let token = match self {
            Self::Token(token) => token,
            Self::List(items) => match items.into_iter().next() {
                Some(serde_json::Value::String(token)) => token,
                _ => return None,
            },
            Self::Other(_) => return None,
        };

        (!token.trim().is_empty()).then_some(token)
    }
}

/// Normalize an arbitrary JSON landmark value
pub fn normalize_landmarks(value: serde_json::Value) -> Option<String> {
    serde_json::from_value::<RawLandmarks>(value).ok()?.normalize()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_and_single_element_list_agree() {
        assert_eq!(normalize_landmarks(json!("a,b:c,d")).as_deref(), Some("a,b:c,d"));
        assert_eq!(normalize_landmarks(json!(["a,b:c,d"])).as_deref(), Some("a,b:c,d"));
    }

    #[test]
    fn list_uses_first_element() {
        assert_eq!(
            normalize_landmarks(json!(["1,2:3,4", "5,6:7,8"])).as_deref(),
            Some("1,2:3,4")
        );
    }

    #[test]
    fn other_shapes_are_rejected() {
        for value in [
            json!(42),
            json!([]),
            json!([7, "1,2:3,4"]),
            json!({ "landmarks": "1,2" }),
            json!(null),
            json!(true),
            json!(""),
            json!([""]),
        ] {
            assert_eq!(normalize_landmarks(value.clone()), None, "{value}");
        }
    }
}
