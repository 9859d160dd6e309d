//! Classification of input-buffer mutations.
//!
//! Every change to the input buffer is classified exactly once, before it
//! can reach word matching. A buffer starting with [`COMMAND_PREFIX`] belongs
//! to the command interpreter and is never scored.

/// Leading character that switches the buffer into command mode.
pub const COMMAND_PREFIX: char = '/';
/// Toggles the debug overlay.
pub const DEBUG_TRIGGER: &str = "!debug";
/// Ends the round on the spot, without a result.
pub const TERMINAL_TRIGGER: &str = "!abort";
/// Stops the round and asks for hand-entered figures.
pub const CHEAT_TRIGGER: &str = "!godmode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    NormalTyping,
    CommandEnter,
    CommandContinue,
    CommandExit,
    DebugTrigger,
    TerminalTrigger,
    CheatTrigger,
}

impl InputClass {
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            InputClass::CommandEnter | InputClass::CommandContinue | InputClass::CommandExit
        )
    }
}

pub fn classify(buffer: &str, in_command_mode: bool) -> InputClass {
    let prefixed = buffer.starts_with(COMMAND_PREFIX);
    match (in_command_mode, prefixed) {
        (true, true) => InputClass::CommandContinue,
        (true, false) => InputClass::CommandExit,
        (false, true) => InputClass::CommandEnter,
        (false, false) => match buffer {
            DEBUG_TRIGGER => InputClass::DebugTrigger,
            TERMINAL_TRIGGER => InputClass::TerminalTrigger,
            CHEAT_TRIGGER => InputClass::CheatTrigger,
            _ => InputClass::NormalTyping,
        },
    }
}

/// Live per-character state of the buffer against the expected word.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Not typed yet.
    Pending,
}

/// One entry per character of `expected`, plus one `Incorrect` entry for
/// each character typed past its end.
pub fn char_feedback(expected: &str, typed: &str) -> Vec<Outcome> {
    let mut typed_chars = typed.chars();
    let mut feedback: Vec<Outcome> = expected
        .chars()
        .map(|want| match typed_chars.next() {
            Some(got) if got == want => Outcome::Correct,
            Some(_) => Outcome::Incorrect,
            None => Outcome::Pending,
        })
        .collect();
    feedback.extend(typed_chars.map(|_| Outcome::Incorrect));
    feedback
}

/// A character that arrived with the latest mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub position: usize,
    pub char: char,
    pub correct: bool,
}

/// Keystrokes implied by going from `previous` to `buffer`.
///
/// Shrinking or same-length edits produce nothing: corrections never take
/// back keystrokes already counted. Growth by `n` characters counts the last
/// `n` characters of the new buffer, each checked against `expected` at its
/// own position.
pub fn inserted_keystrokes(previous: &str, buffer: &str, expected: &str) -> Vec<Keystroke> {
    let before = previous.chars().count();
    let after = buffer.chars().count();
    if after <= before {
        return vec![];
    }
    buffer
        .chars()
        .enumerate()
        .skip(before)
        .map(|(position, c)| Keystroke {
            position,
            char: c,
            correct: expected.chars().nth(position) == Some(c),
        })
        .collect()
}
