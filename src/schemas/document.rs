use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A retrieved unit of evidence with its source metadata.
///
/// Metadata fields are optional because the corpus was ingested from mixed
/// sources; use [`Passage::display_title`] and [`Passage::display_page`] when
/// rendering instead of reading the raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub text: String,
    /// Identifier of the passage in the document store
    pub source_id: String,
    /// Document title, if the store recorded one
    pub title: Option<String>,
    /// Link to the source document
    pub url: Option<String>,
    /// Page within the source document
    pub page: Option<u32>,
    /// Similarity score assigned by the document store
    pub retrieval_score: f64,
}

impl Passage {
    pub fn new<T: Into<String>, I: Into<String>>(text: T, source_id: I) -> Self {
        Passage {
            text: text.into(),
            source_id: source_id.into(),
            title: None,
            url: None,
            page: None,
            retrieval_score: 0.0,
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.retrieval_score = score;
        self
    }

    /// Title for display: the stored title, else the file name at the end of
    /// the URL, else the source id.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                return title.to_string();
            }
        }
        self.url
            .as_deref()
            .and_then(file_name_from_url)
            .unwrap_or_else(|| self.source_id.clone())
    }

    /// Page for display, `N/A` when unknown.
    pub fn display_page(&self) -> String {
        self.page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Last non-empty path segment of a URL, percent-decoded where possible.
fn file_name_from_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();
    let decoded = urlencoding::decode(&segment)
        .map(|name| name.into_owned())
        .ok();
    Some(decoded.unwrap_or(segment))
}

/// Verdict of the relevance grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PassLabel {
    Yes,
    No,
}

/// A passage together with the grader's verdict on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedPassage {
    pub passage: Passage,
    /// Relevance to the question in [0, 1]
    pub relevance_score: f64,
    pub pass_label: PassLabel,
    pub rationale: String,
}

impl GradedPassage {
    pub fn new(passage: Passage, pass_label: PassLabel, relevance_score: f64) -> Self {
        Self {
            passage,
            relevance_score,
            pass_label,
            rationale: String::new(),
        }
    }

    pub fn with_rationale<S: Into<String>>(mut self, rationale: S) -> Self {
        self.rationale = rationale.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_prefers_stored_title() {
        let passage = Passage::new("text", "doc-1")
            .with_title("Minutes of the 49th General Assembly")
            .with_url("https://example.org/files/ga49.pdf");
        assert_eq!(passage.display_title(), "Minutes of the 49th General Assembly");
    }

    #[test]
    fn test_display_title_falls_back_to_url_file_name() {
        let passage =
            Passage::new("text", "doc-1").with_url("https://example.org/files/BCO%202023.pdf");
        assert_eq!(passage.display_title(), "BCO 2023.pdf");

        let blank = Passage::new("text", "doc-1")
            .with_title("  ")
            .with_url("https://example.org/files/overture-12.pdf/");
        assert_eq!(blank.display_title(), "overture-12.pdf");
    }

    #[test]
    fn test_display_title_keeps_literal_plus() {
        let passage = Passage::new("text", "doc-1").with_url("https://x.org/files/a+b%20c.pdf");
        assert_eq!(passage.display_title(), "a+b c.pdf");
    }

    #[test]
    fn test_display_title_falls_back_to_source_id() {
        let passage = Passage::new("text", "doc-7").with_url("not a url");
        assert_eq!(passage.display_title(), "doc-7");
        assert_eq!(Passage::new("text", "doc-8").display_title(), "doc-8");
    }

    #[test]
    fn test_display_page() {
        assert_eq!(Passage::new("t", "a").with_page(12).display_page(), "12");
        assert_eq!(Passage::new("t", "a").display_page(), "N/A");
    }

    #[test]
    fn test_pass_label_serde() {
        assert_eq!(serde_json::to_string(&PassLabel::Yes).unwrap(), "\"yes\"");
        let label: PassLabel = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(label, PassLabel::No);
    }
}
