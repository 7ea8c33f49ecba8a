use url::Url;

use crate::api::StorageError;

/// Scheme assumed for attached domains given as a bare host.
const DEFAULT_SCHEME: &str = "https";

/// URL of an object inside a container: `{storage_url}/{container}/{path}`.
///
/// Exactly one `/` separates each part regardless of trailing or leading
/// slashes in the inputs. Characters that would start a query or fragment
/// are percent-encoded as part of the path.
pub fn object_url(storage_url: &str, container: &str, relative_path: &str) -> Result<Url, StorageError> {
    check_object_path(container)?;
    check_object_path(relative_path)?;
    let base = parse_base(storage_url)?;
    Ok(append_path(
        base,
        &format!("{}/{}", container.trim_matches('/'), relative_path.trim_start_matches('/')),
    ))
}

/// Public URL of an object served through an attached (CDN) domain.
///
/// The domain may be a bare host (`cdn.example.com`) or a full URL with
/// scheme, port and base path. The object path relative to its container is
/// appended to the domain's own path.
pub fn public_url(attached_domain: &str, relative_path: &str) -> Result<Url, StorageError> {
    check_object_path(relative_path)?;
    let raw = if attached_domain.contains("://") {
        attached_domain.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, attached_domain)
    };
    let base = parse_base(&raw)?;
    Ok(append_path(base, relative_path.trim_start_matches('/')))
}

/// Reject paths with `.` or `..` segments.
///
/// URL parsing resolves them, which would move the object out of its
/// container. Percent-encoded dots and `\` separators count as well,
/// since the parser treats them the same way for http(s) URLs.
pub fn check_object_path(path: &str) -> Result<(), StorageError> {
    let has_dot_segment = path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    });
    if has_dot_segment {
        return Err(StorageError::InvalidRequest(format!(
            "Object path {:?} must not contain . or .. segments",
            path
        )));
    }
    Ok(())
}

fn parse_base(raw: &str) -> Result<Url, StorageError> {
    let url = Url::parse(raw)
        .map_err(|e| StorageError::InvalidRequest(format!("Invalid base URL {:?}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(StorageError::InvalidRequest(format!(
            "URL {:?} cannot carry an object path",
            raw
        )));
    }
    Ok(url)
}

fn append_path(mut base: Url, tail: &str) -> Url {
    let path = format!("{}/{}", base.path().trim_end_matches('/'), tail);
    base.set_path(&path);
    base.set_query(None);
    base.set_fragment(None);
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_collapses_slashes() {
        let expected = "https://123.selcdn.ru/images/a/b.png";
        for (base, path) in [
            ("https://123.selcdn.ru/", "a/b.png"),
            ("https://123.selcdn.ru", "a/b.png"),
            ("https://123.selcdn.ru/", "/a/b.png"),
        ] {
            assert_eq!(object_url(base, "images", path).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_object_url_keeps_base_path() {
        let url = object_url("https://api.example.com/v1/AUTH_abc/", "images", "x.txt").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/AUTH_abc/images/x.txt");
    }

    #[test]
    fn test_object_url_encodes_query_characters() {
        let url = object_url("https://123.selcdn.ru/", "images", "what?.txt").unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(url.path(), "/images/what%3F.txt");
    }

    #[test]
    fn test_public_url_bare_host() {
        let url = public_url("cdn.example.com", "a/b.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a/b.png");
    }

    #[test]
    fn test_public_url_with_scheme_port_and_path() {
        let url = public_url("http://127.0.0.1:8080/static/", "/a/b.png").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/static/a/b.png");
    }

    #[test]
    fn test_public_url_ignores_prefix_inside_path() {
        // The container name appearing again deeper in the path is left alone
        let url = public_url("cdn.example.com", "images/images/x.png").unwrap();
        assert_eq!(url.path(), "/images/images/x.png");
    }

    #[test]
    fn test_dot_segments_rejected() {
        for path in ["../other/x.txt", "a/./b", "a/..", "%2e%2E/x", "a\\..\\b", "."] {
            assert!(
                matches!(check_object_path(path), Err(StorageError::InvalidRequest(_))),
                "{path} accepted"
            );
            assert!(object_url("https://123.selcdn.ru/", "images", path).is_err());
            assert!(public_url("cdn.example.com", path).is_err());
        }
        assert!(object_url("https://123.selcdn.ru/", "..", "x.txt").is_err());
    }

    #[test]
    fn test_dots_inside_names_allowed() {
        for path in ["a/.hidden", "a/b..c", "v1.2/x.tar.gz", "..."] {
            assert!(check_object_path(path).is_ok(), "{path} rejected");
        }
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(matches!(
            object_url("not a url", "images", "x"),
            Err(StorageError::InvalidRequest(_))
        ));
        assert!(public_url("https://", "x").is_err());
    }
}
