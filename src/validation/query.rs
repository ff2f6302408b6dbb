use serde_json::{Map, Value};

/// Convert a raw query string into a JSON object for schema parsing.
///
/// Keys seen once map to a string; repeated keys (`status=read&status=to_read`) map to an
/// array of strings in the order they appeared.
pub fn to_value(raw: Option<&str>) -> Value {
    let mut object = Map::new();
    let Some(raw) = raw else {
        return Value::Object(object);
    };

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = Value::String(value.into_owned());
        match object.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_keys_become_strings() {
        assert_eq!(
            to_value(Some("page=2&search=le%20guin")),
            json!({ "page": "2", "search": "le guin" })
        );
    }

    #[test]
    fn repeated_keys_become_arrays() {
        assert_eq!(
            to_value(Some("status=read&status=to_read&status=hidden")),
            json!({ "status": ["read", "to_read", "hidden"] })
        );
    }

    #[test]
    fn missing_query_is_an_empty_object() {
        assert_eq!(to_value(None), json!({}));
        assert_eq!(to_value(Some("")), json!({}));
    }

    #[test]
    fn empty_values_are_kept_as_empty_strings() {
        assert_eq!(to_value(Some("limit=")), json!({ "limit": "" }));
    }
}
