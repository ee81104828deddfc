use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rewrite requested from the AI endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    Summary,
    FixGrammar,
    Expand,
}

impl AiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::Summary => "summary",
            AiAction::FixGrammar => "fix_grammar",
            AiAction::Expand => "expand",
        }
    }

    /// Instruction sent to the model ahead of the user's text.
    pub fn prompt(&self, text: &str) -> String {
        match self {
            AiAction::Summary => format!(
                "Summarize the following text concisely in 2-4 sentences. \
                 Keep the same language as the original:\n\n{}",
                text
            ),
            AiAction::FixGrammar => format!(
                "Fix any grammar, spelling, and punctuation errors in the following text. \
                 Return ONLY the corrected text, no explanation:\n\n{}",
                text
            ),
            AiAction::Expand => format!(
                "Expand the following text into a longer, more detailed version. \
                 Keep the same tone:\n\n{}",
                text
            ),
        }
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AiAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(AiAction::Summary),
            "fix_grammar" => Ok(AiAction::FixGrammar),
            "expand" => Ok(AiAction::Expand),
            _ => Err(format!(
                "Invalid action '{}'. Use: summary, fix_grammar, expand",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRequest {
    pub text: String,
    /// Kept as a string so unknown actions reach the server and get a 400.
    pub action: String,
}

impl AiRequest {
    pub fn new(text: impl Into<String>, action: AiAction) -> Self {
        Self {
            text: text.into(),
            action: action.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiResponse {
    pub result: String,
    #[serde(default)]
    pub streaming: bool,
}
