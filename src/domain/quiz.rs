//! Quiz items and the fixed question bank shared by every duel.
//!
//! The bank is loaded once at startup, either from a JSON file named by
//! `QUIZ_BANK_PATH` or from the built-in set, and then shared read-only
//! behind an `Arc`. Items are served in file order; there is no shuffling.

use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// A single question with its options and the correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    /// Prompt shown to both players.
    pub question: String,
    /// Options in display order.
    pub options: Vec<String>,
    /// The option that scores. Must be one of `options`.
    pub answer: String,
}

impl QuizItem {
    /// Creates an item from string slices.
    #[must_use]
    pub fn new(question: &str, options: &[&str], answer: &str) -> Self {
        Self {
            question: question.to_string(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    /// Returns `true` if `answer` is exactly the correct option.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.answer == answer
    }
}

/// Ordered, immutable sequence of [`QuizItem`]s.
#[derive(Debug, Clone)]
pub struct QuizBank {
    items: Vec<QuizItem>,
}

impl QuizBank {
    /// Builds a bank from the given items.
    ///
    /// # Errors
    ///
    /// Fails if the list is empty, an item has no options, or an item's
    /// answer is not one of its options.
    pub fn new(items: Vec<QuizItem>) -> anyhow::Result<Self> {
        if items.is_empty() {
            bail!("quiz bank must contain at least one item");
        }
        for (index, item) in items.iter().enumerate() {
            if item.options.is_empty() {
                bail!("quiz item {index} has no options");
            }
            if !item.options.contains(&item.answer) {
                bail!(
                    "quiz item {index}: answer {:?} is not one of its options",
                    item.answer
                );
            }
        }
        Ok(Self { items })
    }

    /// The five questions the game ships with.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            items: vec![
                QuizItem::new(
                    "What is the capital of France?",
                    &["London", "Berlin", "Paris", "Madrid"],
                    "Paris",
                ),
                QuizItem::new(
                    "Which planet is known as the Red Planet?",
                    &["Venus", "Mars", "Jupiter", "Saturn"],
                    "Mars",
                ),
                QuizItem::new(
                    "What is the capital of China?",
                    &["Tokyo", "Seoul", "Beijing", "Shanghai"],
                    "Beijing",
                ),
                QuizItem::new(
                    "Who painted the Mona Lisa?",
                    &["Van Gogh", "Picasso", "Da Vinci", "Rembrandt"],
                    "Da Vinci",
                ),
                QuizItem::new(
                    "What is the chemical symbol for gold?",
                    &["Ag", "Fe", "Au", "Cu"],
                    "Au",
                ),
            ],
        }
    }

    /// Loads a bank from a JSON array of items.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON, or does not
    /// pass the checks in [`QuizBank::new`].
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading quiz bank {}", path.display()))?;
        let items: Vec<QuizItem> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing quiz bank {}", path.display()))?;
        Self::new(items).with_context(|| format!("validating quiz bank {}", path.display()))
    }

    /// Returns the item for a 0-based round index.
    #[must_use]
    pub fn get(&self, round: usize) -> Option<&QuizItem> {
        self.items.get(round)
    }

    /// Number of rounds in every duel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false` for a bank built through the public constructors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items in round order.
    pub fn iter(&self) -> impl Iterator<Item = &QuizItem> {
        self.items.iter()
    }
}
