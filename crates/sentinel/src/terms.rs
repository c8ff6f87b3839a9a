//! Forbidden-term scanner.
//!
//! Compiles the configured social-engagement terms into a [`RegexSet`] of
//! escaped, case-insensitive literals so one pass over a text tells which
//! terms it contains.

use integrity_core::EngineError;
use regex::RegexSet;

pub struct TermScanner {
    set: RegexSet,
    terms: Vec<String>,
}

impl TermScanner {
    /// Compile `terms` into a scanner. Matching is a case-insensitive
    /// substring test; terms are taken literally.
    ///
    /// An empty or whitespace-only term would match every text, so it is
    /// rejected with [`EngineError::InvalidTerm`].
    pub fn new(terms: &[String]) -> Result<Self, EngineError> {
        if let Some(pos) = terms.iter().position(|t| t.trim().is_empty()) {
            return Err(EngineError::InvalidTerm(format!(
                "term #{} is empty",
                pos + 1
            )));
        }

        let patterns: Vec<String> = terms
            .iter()
            .map(|t| format!("(?i){}", regex::escape(t.trim())))
            .collect();

        let set = RegexSet::new(&patterns).map_err(|e| EngineError::InvalidTerm(e.to_string()))?;

        Ok(Self {
            set,
            terms: terms.iter().map(|t| t.trim().to_string()).collect(),
        })
    }

    /// Terms found in `text`, in catalogue order.
    pub fn find<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.set
            .matches(text)
            .into_iter()
            .map(|idx| self.terms[idx].as_str())
            .collect()
    }

    /// Terms found in any of `texts`, in catalogue order, without repeats.
    pub fn find_any<'a>(&'a self, texts: &[&str]) -> Vec<&'a str> {
        let mut hits = vec![false; self.terms.len()];
        for text in texts {
            for idx in self.set.matches(text).into_iter() {
                hits[idx] = true;
            }
        }
        hits.iter()
            .zip(&self.terms)
            .filter(|(hit, _)| **hit)
            .map(|(_, term)| term.as_str())
            .collect()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

impl std::fmt::Debug for TermScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermScanner")
            .field("terms", &self.terms)
            .finish()
    }
}
