//! Command rule data types
//!
//! Rules are plain data: an ordered list of trigger phrases, the action
//! they produce, and a human description. Nothing here is executable, so
//! tables can be serialized, diffed and compared across languages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// A recognized user intent, independent of the phrase or language used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddMoney,
    CreateGoal,
    CheckBalance,
    ShowRewards,
    OpenSettings,
    GoDashboard,
    ShowCharts,
    ShowHelp,
    Logout,
    SavingsShopping,
    MyTransactions,
    ViewRewards,
    GoBack,
}

impl Action {
    /// Symbolic tag, e.g. `ADD_MONEY`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AddMoney => "ADD_MONEY",
            Self::CreateGoal => "CREATE_GOAL",
            Self::CheckBalance => "CHECK_BALANCE",
            Self::ShowRewards => "SHOW_REWARDS",
            Self::OpenSettings => "OPEN_SETTINGS",
            Self::GoDashboard => "GO_DASHBOARD",
            Self::ShowCharts => "SHOW_CHARTS",
            Self::ShowHelp => "SHOW_HELP",
            Self::Logout => "LOGOUT",
            Self::SavingsShopping => "SAVINGS_SHOPPING",
            Self::MyTransactions => "MY_TRANSACTIONS",
            Self::ViewRewards => "VIEW_REWARDS",
            Self::GoBack => "GO_BACK",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One entry of a language's command table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRule {
    /// Trigger phrases; any one appearing in the transcript matches
    pub phrases: Vec<String>,
    pub action: Action,
    pub description: String,
}

impl CommandRule {
    pub fn new(action: Action, phrases: &[&str], description: &str) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            action,
            description: description.to_string(),
        }
    }
}

/// Ordered rules for a single language. Declaration order is match order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTable {
    pub language: Language,
    pub rules: Vec<CommandRule>,
}

/// A rule appended to a built-in table from a grammar file
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraRule {
    pub language: Language,
    pub action: Action,
    pub phrases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Top-level layout of a grammar file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarFile {
    #[serde(default)]
    pub rules: Vec<ExtraRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tag_matches_serde() {
        let json = serde_json::to_string(&Action::CheckBalance).unwrap();
        assert_eq!(json, format!("\"{}\"", Action::CheckBalance.tag()));
        let action: Action = serde_json::from_str(r#""GO_BACK""#).unwrap();
        assert_eq!(action, Action::GoBack);
    }

    #[test]
    fn test_grammar_file_parse() {
        let file: GrammarFile = toml::from_str(
            r#"
            [[rules]]
            language = "en"
            action = "CHECK_BALANCE"
            phrases = ["how much money"]
            "#,
        )
        .unwrap();
        assert_eq!(file.rules.len(), 1);
        assert_eq!(file.rules[0].action, Action::CheckBalance);
        assert!(file.rules[0].description.is_none());
    }
}
