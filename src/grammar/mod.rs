//! Command grammar: per-language pattern tables and a single match function
//!
//! Each rule's phrases are compiled once into a case-insensitive regex that
//! matches any of them anywhere in the transcript. Compiled matchers hold no
//! mutable state, so classification is a pure function of
//! `(transcript, language)`.

mod rules;
mod tables;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use crate::error::GrammarError;
use crate::language::Language;

pub use rules::{Action, CommandRule, CommandTable, ExtraRule, GrammarFile};
pub use tables::builtin_table;

/// Language used when a table is missing for the requested code
pub const DEFAULT_LANGUAGE: Language = Language::En;

struct CompiledTable {
    table: CommandTable,
    matchers: Vec<Regex>,
}

impl CompiledTable {
    fn compile(table: CommandTable) -> Result<Self, GrammarError> {
        let matchers = table
            .rules
            .iter()
            .map(|rule| compile_rule(table.language, rule))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { table, matchers })
    }
}

fn compile_rule(language: Language, rule: &CommandRule) -> Result<Regex, GrammarError> {
    let phrases: Vec<String> = rule
        .phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();

    if phrases.is_empty() {
        return Err(GrammarError::EmptyRule {
            language: language.to_string(),
            action: rule.action.to_string(),
        });
    }

    RegexBuilder::new(&phrases.join("|"))
        .case_insensitive(true)
        .build()
        .map_err(|source| GrammarError::Pattern {
            action: rule.action.to_string(),
            source,
        })
}

/// Immutable set of command tables keyed by language
pub struct CommandGrammar {
    tables: BTreeMap<Language, CompiledTable>,
}

impl std::fmt::Debug for CommandGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGrammar")
            .field("languages", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandGrammar {
    /// Grammar with the built-in tables for every supported language
    pub fn builtin() -> Result<Self, GrammarError> {
        Self::from_tables(Language::ALL.iter().map(|&l| builtin_table(l)))
    }

    /// Build a grammar from explicit tables
    pub fn from_tables(tables: impl IntoIterator<Item = CommandTable>) -> Result<Self, GrammarError> {
        let tables = tables
            .into_iter()
            .map(|t| -> Result<_, GrammarError> { Ok((t.language, CompiledTable::compile(t)?)) })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { tables })
    }

    /// Built-in tables with extra rules appended after the built-in ones
    pub fn with_extra_rules(extra: Vec<ExtraRule>) -> Result<Self, GrammarError> {
        let mut tables: BTreeMap<Language, CommandTable> = Language::ALL
            .iter()
            .map(|&l| (l, builtin_table(l)))
            .collect();

        for rule in extra {
            let description = rule
                .description
                .unwrap_or_else(|| rule.action.tag().to_string());
            debug!(language = %rule.language, action = %rule.action, "appending grammar rule");
            tables
                .entry(rule.language)
                .or_insert_with(|| CommandTable {
                    language: rule.language,
                    rules: Vec::new(),
                })
                .rules
                .push(CommandRule {
                    phrases: rule.phrases,
                    action: rule.action,
                    description,
                });
        }

        Self::from_tables(tables.into_values())
    }

    /// Built-in tables plus the rules in a TOML grammar file
    pub fn load_with_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file: {}", path.display()))?;
        let file: GrammarFile = toml::from_str(&content).map_err(GrammarError::from)?;
        info!(path = %path.display(), rules = file.rules.len(), "loaded extra grammar rules");
        Ok(Self::with_extra_rules(file.rules)?)
    }

    /// Classify a transcript against the table for `language_code`,
    /// falling back to the default language for unknown codes.
    pub fn match_action(&self, transcript: &str, language_code: &str) -> Option<Action> {
        let language = Language::from_code(language_code).unwrap_or(DEFAULT_LANGUAGE);
        self.match_in(transcript, language)
    }

    /// Classify a transcript against a specific language's table.
    /// First matching rule in declaration order wins.
    pub fn match_in(&self, transcript: &str, language: Language) -> Option<Action> {
        if transcript.trim().is_empty() {
            return None;
        }

        let compiled = self.compiled(language)?;
        compiled
            .matchers
            .iter()
            .zip(&compiled.table.rules)
            .find(|(matcher, _)| matcher.is_match(transcript))
            .map(|(_, rule)| rule.action)
    }

    /// Ordered rules for a language (with default-language fallback)
    pub fn commands(&self, language: Language) -> &[CommandRule] {
        self.compiled(language)
            .map(|c| c.table.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct actions a language's table can produce
    pub fn action_set(&self, language: Language) -> BTreeSet<Action> {
        self.commands(language).iter().map(|r| r.action).collect()
    }

    /// Languages with a table
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.tables.keys().copied()
    }

    /// Plain-data copy of a table, for snapshots and IPC
    pub fn table(&self, language: Language) -> Option<&CommandTable> {
        self.tables.get(&language).map(|c| &c.table)
    }

    fn compiled(&self, language: Language) -> Option<&CompiledTable> {
        self.tables
            .get(&language)
            .or_else(|| self.tables.get(&DEFAULT_LANGUAGE))
    }
}
