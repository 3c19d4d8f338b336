use serde::Deserialize;
use serde_json::{Map, Value};
use stratus_core::{value, Error, Result};

/// Rewrite a decoded response tree into the shape the payload structs
/// expect.
///
/// The wire format wraps every list in an `item` (sometimes `member`)
/// element and encodes empty fields as empty strings. This pass unwraps
/// those lists, promoting a lone element to a one-element array, drops
/// empty-string fields, and lifts pagination tokens off the wrapper
/// element. The `instancesSet` tree is the one exception: a lone entry
/// stays a plain object there.
pub(crate) fn normalize(v: Value) -> Value {
    match v {
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, value) in fields {
                if matches!(&value, Value::String(s) if s.is_empty()) {
                    continue;
                }
                match value {
                    Value::Object(mut inner) => {
                        let wrapped = inner.remove("item").or_else(|| inner.remove("member"));
                        match wrapped {
                            Some(Value::Array(items)) => {
                                out.insert(
                                    key,
                                    Value::Array(items.into_iter().map(normalize).collect()),
                                );
                                hoist_next_token(&inner, &mut out);
                            }
                            Some(single) => {
                                if key == "instancesSet" {
                                    out.insert(key, normalize(single));
                                } else {
                                    out.insert(key, Value::Array(vec![normalize(single)]));
                                }
                                hoist_next_token(&inner, &mut out);
                            }
                            None => {
                                out.insert(key, normalize(Value::Object(inner)));
                            }
                        }
                    }
                    Value::Array(items) => {
                        out.insert(key, Value::Array(items.into_iter().map(normalize).collect()));
                    }
                    other => {
                        out.insert(key, other);
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Pagination tokens ride on the list wrapper; lift them up beside the
/// unwrapped list so page structs can decode them. The lowercase spelling
/// wins when both are present.
fn hoist_next_token(wrapper: &Map<String, Value>, out: &mut Map<String, Value>) {
    match wrapper.get("nextToken") {
        Some(Value::String(token)) if !token.is_empty() => {
            out.insert("nextToken".to_string(), Value::String(token.clone()));
        }
        _ => {
            if let Some(Value::String(token)) = wrapper.get("NextToken") {
                if !token.is_empty() {
                    out.insert("NextToken".to_string(), Value::String(token.clone()));
                }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ProviderError {
    code: String,
    error_no: String,
    message: String,
}

/// Surface the provider's error envelope, if the response carries one.
///
/// Failures come back as HTTP 200 with a `Response.Errors.Error` body, so
/// this runs on every response regardless of status.
pub(crate) fn check_provider_error(tree: &Value) -> Result<()> {
    let Some(node) = value::get_at(tree, &["Response", "Errors", "Error"]) else {
        return Ok(());
    };
    let err: ProviderError = serde_json::from_value(node.clone()).unwrap_or_default();
    if err.code.is_empty() {
        return Ok(());
    }
    let message = if err.error_no.is_empty() {
        format!("{}: {}", err.code, err.message)
    } else {
        format!("{} (errno {}): {}", err.code, err.error_no, err.message)
    };
    Err(Error::provider(message))
}

/// Descend past the `<Action>Response` wrapper when the response has one.
pub(crate) fn unwrap_action(mut tree: Value, action: &str) -> Value {
    if let Value::Object(fields) = &mut tree {
        if let Some(inner) = fields.remove(&format!("{action}Response")) {
            return inner;
        }
    }
    tree
}
