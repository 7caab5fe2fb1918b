use serde::Serialize;

/// One catalog entry recovered from scraping. Immutable once built; both
/// fields are guaranteed non-empty and `image_url` is absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "image")]
    pub image_url: String,
}

/// Collapse whitespace runs (including line breaks) to single spaces and
/// trim the ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn a raw `(name, image ref)` candidate into a [`Record`], or drop it.
///
/// A site-relative image ref (leading `/`) is resolved against `base_url`;
/// anything else is passed through as-is. Candidates with an empty name or
/// image after cleanup yield `None` and must not be stored partial.
pub fn normalize(raw_name: &str, raw_image: &str, base_url: &str) -> Option<Record> {
    let display_name = collapse_whitespace(raw_name);
    if display_name.is_empty() {
        return None;
    }

    let raw_image = raw_image.trim();
    if raw_image.is_empty() {
        return None;
    }
    let image_url = if raw_image.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), raw_image)
    } else {
        raw_image.to_string()
    };

    Some(Record {
        display_name,
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_image_is_resolved_against_base() {
        let record = normalize("Lone Wolf Ashes", "/img/x.png", "https://example.org").unwrap();
        assert_eq!(record.image_url, "https://example.org/img/x.png");
    }

    #[test]
    fn absolute_image_passes_through() {
        let record = normalize("Mimic Tear", "https://cdn.example.org/mimic.png", "https://example.org").unwrap();
        assert_eq!(record.image_url, "https://cdn.example.org/mimic.png");
    }

    #[test]
    fn name_whitespace_is_collapsed() {
        let record = normalize("  Carian \n\n  Slicer ", "/a.png", "https://example.org").unwrap();
        assert_eq!(record.display_name, "Carian Slicer");
    }

    #[test]
    fn whitespace_only_name_is_dropped() {
        assert!(normalize("   \n  ", "/a.png", "https://example.org").is_none());
    }

    #[test]
    fn empty_image_is_dropped() {
        assert!(normalize("Radagon Icon", "", "https://example.org").is_none());
        assert!(normalize("Radagon Icon", "  ", "https://example.org").is_none());
    }

    #[test]
    fn trailing_slash_on_base_does_not_double() {
        let record = normalize("Rivers of Blood", "/img/r.png", "https://example.org/").unwrap();
        assert_eq!(record.image_url, "https://example.org/img/r.png");
    }
}
