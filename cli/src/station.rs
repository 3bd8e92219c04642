//! Operator conveniences: text normalisation, QSO macros and call-sign
//! recognition on received text.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MacroError {
    #[error("No DX call given (use --dx)")]
    MissingDxCall,
}

/// Shifted characters typed by accident on a German/US keyboard, mapped back
/// to the digit on the same key.
const SHIFT_MAP: [(char, char); 15] = [
    ('!', '1'),
    ('"', '2'),
    ('§', '3'),
    ('$', '4'),
    ('%', '5'),
    ('&', '6'),
    ('/', '7'),
    ('(', '8'),
    (')', '9'),
    ('=', '0'),
    ('@', '2'),
    ('#', '3'),
    ('^', '6'),
    ('*', '8'),
    ('+', '1'),
];

fn unshift(c: char) -> char {
    SHIFT_MAP
        .iter()
        .find(|(shifted, _)| *shifted == c)
        .map_or(c, |&(_, digit)| digit)
}

/// Uppercase and replace shifted digits.
pub fn normalize_text(text: &str) -> String {
    text.to_uppercase().chars().map(unshift).collect()
}

/// Canned QSO messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Macro {
    /// General call, or a directed call when a DX call is set
    Cq,
    /// Reply with a signal report
    Answer,
    /// Sign off
    Bye,
}

impl Macro {
    pub fn render(self, my_call: &str, dx_call: Option<&str>, rst: &str) -> Result<String, MacroError> {
        let dx = dx_call.map(str::trim).filter(|dx| !dx.is_empty());
        let text = match (self, dx) {
            (Macro::Cq, Some(dx)) => format!("CQ {} DE {} K", dx, my_call),
            (Macro::Cq, None) => format!("CQ CQ DE {0} {0} K", my_call),
            (Macro::Answer, Some(dx)) => format!("{} DE {} R {} TNX K", dx, my_call, rst),
            (Macro::Answer, None) => return Err(MacroError::MissingDxCall),
            (Macro::Bye, dx) => format!("{} DE {} 73 SK", dx.unwrap_or("CQ"), my_call),
        };
        Ok(text.to_uppercase())
    }
}

/// Keep only the characters a call sign may contain.
fn clean_word(word: &str) -> String {
    word.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '/')
        .collect()
}

/// Words that look like call signs: at least three of `A-Z0-9/` with one digit.
pub fn find_callsigns(text: &str) -> Vec<String> {
    text.split(' ')
        .map(clean_word)
        .filter(|w| w.len() >= 3 && w.chars().any(|c| c.is_ascii_digit()))
        .collect()
}

/// True when a received message mentions the station's own call.
pub fn is_call_for(text: &str, my_call: &str) -> bool {
    let my_call = my_call.trim().to_uppercase();
    !my_call.is_empty() && text.to_uppercase().contains(&my_call)
}
