use super::image::GenerationResult;
use serde::Serialize;

/// Append-only record of successful generations, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedImageHistory {
    entries: Vec<GenerationResult>,
}

impl GeneratedImageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: GenerationResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenerationResult> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[GenerationResult] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&GenerationResult> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&GenerationResult> {
        self.entries.last()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.entries.iter().any(|entry| entry.image_url() == url)
    }

    /// Most recent entry carrying `url`; identical URLs may repeat.
    pub fn find_by_url(&self, url: &str) -> Option<&GenerationResult> {
        self.entries.iter().rev().find(|entry| entry.image_url() == url)
    }
}

impl<'a> IntoIterator for &'a GeneratedImageHistory {
    type Item = &'a GenerationResult;
    type IntoIter = std::slice::Iter<'a, GenerationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut history = GeneratedImageHistory::new();
        history.push(GenerationResult::new("https://cdn/a1.png", "a red bicycle"));
        history.push(GenerationResult::new("https://cdn/a2.png", "a blue bicycle"));

        let urls: Vec<&str> = history.iter().map(|r| r.image_url()).collect();
        assert_eq!(urls, vec!["https://cdn/a1.png", "https://cdn/a2.png"]);
        assert_eq!(history.last().unwrap().prompt(), "a blue bicycle");
    }

    #[test]
    fn test_find_by_url_prefers_latest() {
        let mut history = GeneratedImageHistory::new();
        history.push(GenerationResult::new("https://cdn/same.png", "first"));
        history.push(GenerationResult::new("https://cdn/same.png", "second"));

        assert!(history.contains_url("https://cdn/same.png"));
        assert!(!history.contains_url("https://cdn/other.png"));
        assert_eq!(
            history.find_by_url("https://cdn/same.png").unwrap().prompt(),
            "second"
        );
    }
}
