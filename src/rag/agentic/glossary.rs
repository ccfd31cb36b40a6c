use std::collections::BTreeMap;

use regex::Regex;

use crate::rag::RAGError;

/// Acronyms used throughout PCA governance documents.
pub fn default_glossary() -> BTreeMap<String, String> {
    [
        ("BCO", "Book of Church Order"),
        ("CCB", "Committee on Constitutional Business"),
        ("GA", "General Assembly"),
        ("LC", "Westminster Larger Catechism"),
        ("MNA", "Mission to North America"),
        ("MTW", "Mission to the World"),
        ("PCA", "Presbyterian Church in America"),
        ("RE", "Ruling Elder"),
        ("RPR", "Review of Presbytery Records"),
        ("RUF", "Reformed University Fellowship"),
        ("SC", "Westminster Shorter Catechism"),
        ("SJC", "Standing Judicial Commission"),
        ("TE", "Teaching Elder"),
        ("WCF", "Westminster Confession of Faith"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone)]
struct GlossaryEntry {
    acronym: String,
    expansion: String,
    pattern: Regex,
}

/// Compiled acronym table.
///
/// Acronyms match case-sensitively on word boundaries, so "GA" matches in
/// "the GA voted" but not in "GAS" or "ga".
#[derive(Debug, Clone)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

impl Glossary {
    /// Compile a word-boundary matcher for every acronym in `table`.
    pub fn new(table: &BTreeMap<String, String>) -> Result<Self, RAGError> {
        let entries = table
            .iter()
            .map(|(acronym, expansion)| {
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(acronym)))
                    .map_err(|e| {
                        RAGError::InvalidConfiguration(format!(
                            "glossary entry '{}': {}",
                            acronym, e
                        ))
                    })?;
                Ok(GlossaryEntry {
                    acronym: acronym.clone(),
                    expansion: expansion.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, RAGError>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `ACRONYM = expansion` line per entry.
    pub fn prompt_block(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} = {}", e.acronym, e.expansion))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Append `(ACRONYM: expansion)` for every acronym in `text` whose
    /// expansion is not already spelled out. Entries are appended in
    /// alphabetical order of acronym.
    pub fn expand(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let missing: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.pattern.is_match(text))
            .filter(|e| !lowered.contains(&e.expansion.to_lowercase()))
            .map(|e| format!("({}: {})", e.acronym, e.expansion))
            .collect();

        if missing.is_empty() {
            text.to_string()
        } else {
            format!("{} {}", text, missing.join(" "))
        }
    }
}

impl Default for Glossary {
    fn default() -> Self {
        // Escaped acronyms always compile.
        Self::new(&default_glossary()).unwrap_or_else(|_| Self {
            entries: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_appends_missing_expansions() {
        let glossary = Glossary::default();
        let expanded = glossary.expand("What does BCO 21 say about a TE?");
        assert_eq!(
            expanded,
            "What does BCO 21 say about a TE? (BCO: Book of Church Order) (TE: Teaching Elder)"
        );
    }

    #[test]
    fn test_expand_skips_spelled_out_and_partial_words() {
        let glossary = Glossary::default();
        let text = "Book of Church Order (BCO) rules on GASOLINE and teachers";
        assert_eq!(glossary.expand(text), text);
    }

    #[test]
    fn test_prompt_block_lists_entries() {
        let mut table = BTreeMap::new();
        table.insert("SJC".to_string(), "Standing Judicial Commission".to_string());
        let glossary = Glossary::new(&table).unwrap();
        assert_eq!(glossary.prompt_block(), "SJC = Standing Judicial Commission");
        assert!(!glossary.is_empty());
    }
}
