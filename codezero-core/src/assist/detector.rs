/// Decides whether simulated program output is waiting for user input.
///
/// There is no reliable contract for this: the collaborator only returns text.
/// Implementations are heuristics and are expected to be swapped out.
pub trait InputPromptDetector: Send + Sync {
    fn awaits_input(&self, output: &str) -> bool;
}

/// Flags output whose last non-empty line mentions one of a set of keywords.
#[derive(Debug, Clone)]
pub struct KeywordPromptDetector {
    keywords: Vec<String>,
}

impl Default for KeywordPromptDetector {
    fn default() -> Self {
        Self::new(["enter", "input"])
    }
}

impl KeywordPromptDetector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }
}

impl InputPromptDetector for KeywordPromptDetector {
    fn awaits_input(&self, output: &str) -> bool {
        let Some(last) = output.lines().rev().find(|l| !l.trim().is_empty()) else {
            return false;
        };
        let last = last.to_lowercase();
        self.keywords.iter().any(|k| last.contains(k.as_str()))
    }
}
