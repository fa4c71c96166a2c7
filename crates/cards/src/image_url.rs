use url::Url;

const UNSPLASH_IMAGE_HOST: &str = "images.unsplash.com";
const UNSPLASH_HOST_SUFFIX: &str = "unsplash.com";
const UNSPLASH_PHOTO_PREFIX: &str = "/photos/";

/// Prefers https and turns Unsplash photo pages into direct download links.
///
/// Never fails: anything that can't be parsed is returned as given (after the
/// https upgrade).
pub fn normalize_image_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url.filter(|url| !url.is_empty())?;
    let safe_url = match raw_url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => raw_url.to_owned(),
    };

    let Ok(parsed) = Url::parse(&safe_url) else {
        return Some(safe_url);
    };
    let host = parsed.host_str().unwrap_or_default();
    if host == UNSPLASH_IMAGE_HOST {
        return Some(safe_url);
    }
    if host.ends_with(UNSPLASH_HOST_SUFFIX) && parsed.path().starts_with(UNSPLASH_PHOTO_PREFIX) {
        let Some(slug) = parsed.path().split('/').filter(|part| !part.is_empty()).nth(1) else {
            return Some(safe_url);
        };
        // slugs look like `beach-sunset-abc123`; the id is the last segment
        let id = slug.rsplit('-').next().unwrap_or(slug);
        return Some(format!(
            "https://unsplash.com/photos/{id}/download?force=true&w=1200"
        ));
    }
    Some(safe_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(url: &str) -> Option<String> {
        normalize_image_url(Some(url))
    }

    #[test]
    fn absent_stays_absent() {
        assert_eq!(normalize_image_url(None), None);
        assert_eq!(normalize_image_url(Some("")), None);
    }

    #[test]
    fn upgrades_plain_http() {
        assert_eq!(
            normalize("http://images.unsplash.com/foo").as_deref(),
            Some("https://images.unsplash.com/foo")
        );
        assert_eq!(
            normalize("http://example.com/cat.png").as_deref(),
            Some("https://example.com/cat.png")
        );
    }

    #[test]
    fn rewrites_unsplash_photo_pages() {
        assert_eq!(
            normalize("https://unsplash.com/photos/beach-sunset-abc123").as_deref(),
            Some("https://unsplash.com/photos/abc123/download?force=true&w=1200")
        );
        assert_eq!(
            normalize("http://www.unsplash.com/photos/XyZ987").as_deref(),
            Some("https://unsplash.com/photos/XyZ987/download?force=true&w=1200")
        );
    }

    #[test]
    fn unsplash_without_slug_is_unchanged() {
        assert_eq!(
            normalize("https://unsplash.com/photos/").as_deref(),
            Some("https://unsplash.com/photos/")
        );
        assert_eq!(
            normalize("https://unsplash.com/collections/42").as_deref(),
            Some("https://unsplash.com/collections/42")
        );
    }

    #[test]
    fn unparseable_input_passes_through() {
        assert_eq!(normalize("not a url").as_deref(), Some("not a url"));
        assert_eq!(normalize("/relative/path.jpg").as_deref(), Some("/relative/path.jpg"));
    }
}
