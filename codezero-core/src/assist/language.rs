use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Cpp,
    C,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::Python, Self::Java, Self::Cpp, Self::C];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::Java => ".java",
            Self::Cpp => ".cpp",
            Self::C => ".c",
        }
    }

    /// File name used when the editor content is downloaded.
    pub fn download_name(self) -> String {
        format!("codezero-code{}", self.extension())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Java => "Java",
            Self::Cpp => "C++",
            Self::C => "C",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
