//! Helpers for working with JSON value trees.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Borrow the subtree at `path`, if every key along the way exists.
pub fn get_at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    Some(cur)
}

/// Decode the subtree at `path` into `T`.
///
/// Missing keys and shape mismatches both surface as decode errors naming
/// the full path, so provider payload drift shows up with context instead
/// of a bare serde message.
pub fn decode_at<T: DeserializeOwned>(v: &Value, path: &[&str]) -> Result<T> {
    let subtree = get_at(v, path)
        .ok_or_else(|| Error::decode(format!("response has no `{}` field", path.join("."))))?;
    serde_json::from_value(subtree.clone()).map_err(|e| {
        Error::decode(format!("response field `{}` has unexpected shape", path.join("."))).with_source(e)
    })
}

/// Decode the list at `path`, treating an absent path as an empty list.
///
/// Query APIs omit the wrapping element entirely when a result set is
/// empty, so "no such key" and "zero items" are the same answer here. A
/// present subtree with the wrong shape is still an error.
pub fn decode_list_at<T: DeserializeOwned>(v: &Value, path: &[&str]) -> Result<Vec<T>> {
    match get_at(v, path) {
        None => Ok(Vec::new()),
        Some(subtree) => serde_json::from_value(subtree.clone()).map_err(|e| {
            Error::decode(format!("response field `{}` has unexpected shape", path.join(".")))
                .with_source(e)
        }),
    }
}

/// Overlay the fields of a freshly fetched payload onto `target` in place.
///
/// Fields the patch does not mention, and fields it reports as empty, keep
/// their current value. Normalization drops empty response elements, so an
/// empty field here means the provider did not report it, not that it was
/// cleared; skipping them keeps lazily fetched state (certificate bodies,
/// for example) across refreshes.
pub fn overlay<T>(target: &mut T, patch: &Value) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let patch = patch
        .as_object()
        .ok_or_else(|| Error::decode("refresh payload is not an object"))?;

    let mut current = serde_json::to_value(&*target)?;
    let fields = current
        .as_object_mut()
        .ok_or_else(|| Error::decode("refresh target is not an object"))?;
    for (key, value) in patch {
        if is_unreported(value) {
            continue;
        }
        fields.insert(key.clone(), value.clone());
    }

    *target = serde_json::from_value(current)?;
    Ok(())
}

fn is_unreported(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Volume {
        volume_id: String,
        size: String,
        status: String,
    }

    #[test]
    fn test_overlay_replaces_present_fields() {
        let mut v = Volume {
            volume_id: "vol-1".to_string(),
            size: "10".to_string(),
            status: "creating".to_string(),
        };
        overlay(&mut v, &json!({"status": "available"})).unwrap();
        assert_eq!(v.status, "available");
        assert_eq!(v.volume_id, "vol-1");
        assert_eq!(v.size, "10");
    }

    #[test]
    fn test_overlay_retains_absent_fields() {
        let mut v = Volume {
            volume_id: "vol-1".to_string(),
            size: "10".to_string(),
            status: "available".to_string(),
        };
        // A list call that omits size entirely must not wipe it.
        overlay(&mut v, &json!({"volume_id": "vol-1", "status": "in-use"})).unwrap();
        assert_eq!(
            v,
            Volume {
                volume_id: "vol-1".to_string(),
                size: "10".to_string(),
                status: "in-use".to_string(),
            }
        );
    }

    #[test]
    fn test_overlay_skips_unreported_fields() {
        let mut v = Volume {
            volume_id: "vol-1".to_string(),
            size: "10".to_string(),
            status: "available".to_string(),
        };
        // Serialized payloads carry unreported fields as empty strings;
        // those must not wipe known state.
        overlay(
            &mut v,
            &json!({"volume_id": "vol-1", "size": "", "status": "in-use"}),
        )
        .unwrap();
        assert_eq!(v.size, "10");
        assert_eq!(v.status, "in-use");
    }

    #[test]
    fn test_overlay_rejects_non_object_patch() {
        let mut v = Volume::default();
        assert!(overlay(&mut v, &json!("available")).is_err());
        assert!(overlay(&mut v, &json!(["available"])).is_err());
    }

    #[test]
    fn test_get_at_and_decode_at() {
        let tree = json!({
            "DescribeVolumesResponse": {
                "volumeSet": [
                    {"volume_id": "vol-1", "size": "10", "status": "available"}
                ]
            }
        });
        assert_eq!(
            get_at(&tree, &["DescribeVolumesResponse", "volumeSet"]),
            Some(&json!([{"volume_id": "vol-1", "size": "10", "status": "available"}]))
        );
        assert_eq!(get_at(&tree, &["DescribeVolumesResponse", "missing"]), None);

        let volumes: Vec<Volume> =
            decode_at(&tree, &["DescribeVolumesResponse", "volumeSet"]).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].volume_id, "vol-1");

        let err = decode_at::<Vec<Volume>>(&tree, &["DescribeVolumesResponse", "nope"])
            .unwrap_err();
        assert!(err.to_string().contains("DescribeVolumesResponse.nope"));
    }

    #[test]
    fn test_decode_list_at_treats_absent_as_empty() {
        let tree = json!({"DescribeVolumesResponse": {}});
        let volumes: Vec<Volume> =
            decode_list_at(&tree, &["DescribeVolumesResponse", "volumeSet"]).unwrap();
        assert!(volumes.is_empty());

        // A present subtree of the wrong shape is still an error.
        let tree = json!({"volumeSet": "not-a-list"});
        assert!(decode_list_at::<Volume>(&tree, &["volumeSet"]).is_err());
    }
}
