//! Cursor position report parser
//!
//! Recognizes `ESC [ row ; col R` one byte at a time. The row and column
//! digits are discarded; only the completion of the reply matters.

/// Parser state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplyState {
    /// Scanning for ESC
    #[default]
    WaitEsc,
    /// ESC seen, next byte is taken as `[`
    WaitBracket,
    /// Row digits until `;`
    WaitSemicolon,
    /// Column digits until `R`
    WaitR,
    /// Reply fully consumed
    Complete,
}

/// State machine for a single cursor position report
#[derive(Debug, Default)]
pub struct ReplyParser {
    state: ReplyState,
    consumed: usize,
}

impl ReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a single byte to the parser
    pub fn feed(&mut self, byte: u8) -> ReplyState {
        self.state = match self.state {
            ReplyState::WaitEsc if byte == 0x1B => ReplyState::WaitBracket,
            ReplyState::WaitEsc => ReplyState::WaitEsc,
            // Positional: the byte after ESC is not checked
            ReplyState::WaitBracket => ReplyState::WaitSemicolon,
            ReplyState::WaitSemicolon if byte == b';' => ReplyState::WaitR,
            ReplyState::WaitSemicolon => ReplyState::WaitSemicolon,
            ReplyState::WaitR if byte == b'R' => ReplyState::Complete,
            ReplyState::WaitR => ReplyState::WaitR,
            ReplyState::Complete => return ReplyState::Complete,
        };
        self.consumed += 1;
        self.state
    }

    #[cfg(test)]
    pub fn state(&self) -> ReplyState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ReplyState::Complete
    }

    /// Bytes consumed since the last reset
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Prepare for the next reply
    pub fn reset(&mut self) {
        self.state = ReplyState::WaitEsc;
        self.consumed = 0;
    }
}
