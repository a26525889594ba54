// src/attempt/ledger.rs

use crate::models::{answer::AnswerEntry, definition::OptionKey};

/// Current selection per question. Slots are fixed at initialization;
/// only their selected option ever changes.
#[derive(Debug, Clone, Default)]
pub struct AnswerLedger {
    entries: Vec<AnswerEntry>,
    initialized: bool,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one unset slot per question, in the given order.
    /// Returns `false` (and changes nothing) if the ledger was already initialized.
    pub fn initialize<I>(&mut self, question_numbers: I) -> bool
    where
        I: IntoIterator<Item = u32>,
    {
        if self.initialized {
            return false;
        }
        self.entries = question_numbers
            .into_iter()
            .map(|question_number| AnswerEntry {
                question_number,
                selected_option: None,
            })
            .collect();
        self.initialized = true;
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Sets or overwrites the answer for a question.
    /// Returns `false` for question numbers outside the initialized set.
    pub fn select(&mut self, question_number: u32, option: OptionKey) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.question_number == question_number)
        {
            Some(entry) => {
                entry.selected_option = Some(option);
                true
            }
            None => false,
        }
    }

    pub fn selected(&self, question_number: u32) -> Option<OptionKey> {
        self.entries
            .iter()
            .find(|entry| entry.question_number == question_number)
            .and_then(|entry| entry.selected_option)
    }

    pub fn answered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.selected_option.is_some())
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    /// `100 * answered / total`, rounded half up. `0` for an empty ledger.
    pub fn progress_percent(&self) -> u8 {
        let total = self.total_count();
        if total == 0 {
            return 0;
        }
        let answered = self.answered_count();
        ((answered * 200 + total) / (total * 2)) as u8
    }

    /// Every slot in question order, unset ones included, so the backend can
    /// grade missing answers as wrong.
    pub fn to_submission_payload(&self) -> Vec<AnswerEntry> {
        self.entries.clone()
    }

    pub fn entries(&self) -> &[AnswerEntry] {
        &self.entries
    }
}
