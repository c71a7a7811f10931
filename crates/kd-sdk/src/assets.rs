//! Asset URL rewriting
//!
//! The backend returns uploaded files (logos, avatars, resumes, ...) as
//! server-relative paths. Responses are rewritten so those fields carry a
//! directly loadable absolute URL.

use serde_json::Value;

/// Fields that may carry a server-relative asset path
pub const ASSET_FIELDS: &[&str] = &[
    "logoUrl",
    "avatarUrl",
    "resumeUrl",
    "imageUrl",
    "fileUrl",
    "photoUrl",
];

/// Prefix server-relative asset fields with `origin`.
///
/// Applies to a top-level object, or to each object in a top-level array.
/// Nested objects are left alone.
pub fn rewrite_asset_urls(payload: Value, origin: &str) -> Value {
    let origin = origin.trim_end_matches('/');
    match payload {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_object(item, origin))
                .collect(),
        ),
        other => rewrite_object(other, origin),
    }
}

fn rewrite_object(mut value: Value, origin: &str) -> Value {
    if let Value::Object(map) = &mut value {
        for field in ASSET_FIELDS {
            if let Some(Value::String(url)) = map.get_mut(*field) {
                if is_server_relative(url) {
                    url.insert_str(0, origin);
                }
            }
        }
    }
    value
}

/// `/files/a.png` is server-relative; `//cdn/a.png` and `https://...` are not
fn is_server_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relative_logo_is_prefixed() {
        let out = rewrite_asset_urls(json!({ "logoUrl": "/files/a.png" }), "https://host");
        assert_eq!(out, json!({ "logoUrl": "https://host/files/a.png" }));
    }

    #[test]
    fn test_absolute_logo_is_unchanged() {
        let payload = json!({ "logoUrl": "https://cdn.example/a.png" });
        assert_eq!(rewrite_asset_urls(payload.clone(), "https://host"), payload);
    }

    #[test]
    fn test_array_items_are_rewritten() {
        let out = rewrite_asset_urls(
            json!([
                { "id": 1, "avatarUrl": "/u/1.jpg" },
                { "id": 2, "resumeUrl": "/cv/2.pdf", "photoUrl": null },
                "not-an-object",
            ]),
            "https://host/",
        );
        assert_eq!(
            out,
            json!([
                { "id": 1, "avatarUrl": "https://host/u/1.jpg" },
                { "id": 2, "resumeUrl": "https://host/cv/2.pdf", "photoUrl": null },
                "not-an-object",
            ])
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let payload = json!({
            "imageUrl": "/img/x.png",
            "fileUrl": "https://elsewhere/y",
            "title": "/not/an/asset/field",
        });
        let once = rewrite_asset_urls(payload, "https://host");
        let twice = rewrite_asset_urls(once.clone(), "https://host");
        assert_eq!(once, twice);
        assert_eq!(once["title"], "/not/an/asset/field");
    }

    #[test]
    fn test_non_string_and_protocol_relative_values_untouched() {
        let payload = json!({ "logoUrl": 42, "avatarUrl": "//cdn/a.png" });
        assert_eq!(rewrite_asset_urls(payload.clone(), "https://host"), payload);
    }

    #[test]
    fn test_nested_objects_are_not_scanned() {
        let payload = json!({ "company": { "logoUrl": "/l.png" } });
        assert_eq!(rewrite_asset_urls(payload.clone(), "https://host"), payload);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(rewrite_asset_urls(Value::Null, "https://host"), Value::Null);
        assert_eq!(rewrite_asset_urls(json!("ok"), "https://host"), json!("ok"));
    }
}
