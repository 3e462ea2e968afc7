use serde::{Deserialize, Serialize};

/// A file-type group the user can choose to retain after capture.
/// Everything outside the selected groups is deleted during filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Html,
    Css,
    Js,
    Images,
    Media,
}

impl FileCategory {
    /// The fixed extension set for this category, each with a leading dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileCategory::Html => &[".html", ".htm"],
            FileCategory::Css => &[".css"],
            FileCategory::Js => &[".js"],
            FileCategory::Images => &[".jpg", ".jpeg", ".png", ".gif", ".svg", ".bmp"],
            FileCategory::Media => &[".mp4", ".mp3"],
        }
    }
}

impl std::str::FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(FileCategory::Html),
            "css" => Ok(FileCategory::Css),
            "js" => Ok(FileCategory::Js),
            "images" => Ok(FileCategory::Images),
            "media" => Ok(FileCategory::Media),
            other => Err(format!("unknown file type category: {other}")),
        }
    }
}

/// Whether a file extension (with leading dot) belongs to any of the
/// given categories. Matching is ASCII-case-insensitive.
pub fn is_retained(categories: &[FileCategory], extension: &str) -> bool {
    categories.iter().any(|category| {
        category
            .extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table_matches_categories() {
        assert!(is_retained(&[FileCategory::Html], ".html"));
        assert!(is_retained(&[FileCategory::Html], ".htm"));
        assert!(is_retained(&[FileCategory::Images], ".svg"));
        assert!(is_retained(&[FileCategory::Media], ".mp3"));
        assert!(!is_retained(&[FileCategory::Html], ".css"));
        assert!(!is_retained(&[FileCategory::Css, FileCategory::Js], ".png"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_retained(&[FileCategory::Images], ".PNG"));
        assert!(is_retained(&[FileCategory::Html], ".HTML"));
    }

    #[test]
    fn empty_category_set_retains_nothing() {
        assert!(!is_retained(&[], ".html"));
    }
}
