//! Single round of the word-guessing game.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;

use super::words::WORDS;

/// Gallows drawings, one per wrong guess
const STAGES: [&str; 7] = [
    " +---+\n |   |\n     |\n     |\n     |\n     |\n=========",
    " +---+\n |   |\n O   |\n     |\n     |\n     |\n=========",
    " +---+\n |   |\n O   |\n |   |\n     |\n     |\n=========",
    " +---+\n |   |\n O   |\n/|   |\n     |\n     |\n=========",
    " +---+\n |   |\n O   |\n/|\\  |\n     |\n     |\n=========",
    " +---+\n |   |\n O   |\n/|\\  |\n/    |\n     |\n=========",
    " +---+\n |   |\n O   |\n/|\\  |\n/ \\  |\n     |\n=========",
];

/// Wrong guesses allowed before the round is lost
pub const MAX_ATTEMPTS: u8 = (STAGES.len() - 1) as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Active)
    }
}

/// Hangman state machine. Pure: no I/O.
#[derive(Debug, Clone)]
pub struct WordGuess {
    word: String,
    correct: BTreeSet<char>,
    incorrect: BTreeSet<char>,
    attempts_left: u8,
}

impl Default for WordGuess {
    fn default() -> Self {
        Self::new()
    }
}

impl WordGuess {
    /// Start a round with a word picked at random
    pub fn new() -> Self {
        let word = WORDS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(WORDS[0]);
        Self::with_word(word)
    }

    pub fn with_word(word: &str) -> Self {
        Self {
            word: word.to_ascii_lowercase(),
            correct: BTreeSet::new(),
            incorrect: BTreeSet::new(),
            attempts_left: MAX_ATTEMPTS,
        }
    }

    #[cfg(test)]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[cfg(test)]
    pub fn attempts_left(&self) -> u8 {
        self.attempts_left
    }

    #[cfg(test)]
    pub fn incorrect(&self) -> &BTreeSet<char> {
        &self.incorrect
    }

    /// Apply a validated single letter. Repeating a wrong letter costs nothing.
    pub fn guess(&mut self, letter: char) -> GuessOutcome {
        let letter = letter.to_lowercase().next().unwrap_or(letter);
        if self.word.contains(letter) {
            self.correct.insert(letter);
            return GuessOutcome::Hit;
        }

        if self.incorrect.insert(letter) {
            self.attempts_left = self.attempts_left.saturating_sub(1);
        }
        GuessOutcome::Miss
    }

    pub fn is_won(&self) -> bool {
        self.word.chars().all(|c| self.correct.contains(&c))
    }

    pub fn is_lost(&self) -> bool {
        self.attempts_left == 0
    }

    pub fn status(&self) -> GameStatus {
        if self.is_won() {
            GameStatus::Won
        } else if self.is_lost() {
            GameStatus::Lost
        } else {
            GameStatus::Active
        }
    }

    fn masked_word(&self) -> String {
        self.word
            .chars()
            .map(|c| if self.correct.contains(&c) { c } else { '_' })
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Status board shown in the channel
    pub fn render(&self) -> String {
        let stage = (STAGES.len() - 1)
            .saturating_sub(usize::from(self.attempts_left))
            .min(STAGES.len() - 1);
        let wrong = self
            .incorrect
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        let mut board = format!(
            "```\n{}\n\nWord: {}\n\nIncorrect Guesses: {}\nAttempts Left: {}\n```",
            STAGES[stage],
            self.masked_word(),
            wrong,
            self.attempts_left
        );

        match self.status() {
            GameStatus::Won => board.push_str(&format!(
                "\n**Congratulations! You won! The word was `{}`.**",
                self.word
            )),
            GameStatus::Lost => board.push_str(&format!(
                "\n**Game Over! You lost. The word was `{}`.**",
                self.word
            )),
            GameStatus::Active => board.push_str("\nType a letter to guess."),
        }

        board
    }
}

/// Accept a single alphabetic character (surrounding whitespace ignored)
pub fn parse_guess(text: &str) -> Option<char> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => Some(c.to_lowercase().next().unwrap_or(c)),
        _ => None,
    }
}
