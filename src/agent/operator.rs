//! Human operator interaction.

use std::io::{BufRead, Write};

/// What the operator answered when the model stopped requesting actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorReply {
    /// A follow-up instruction for the model.
    Message(String),
    /// Stop the session.
    Exit,
}

impl OperatorReply {
    /// Interpret one input line. Blank lines yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            return Some(Self::Exit);
        }
        Some(Self::Message(trimmed.to_string()))
    }
}

/// The human side of a session.
pub trait Operator {
    /// Progress text from the model while it keeps working.
    fn narrate(&mut self, text: &str);

    /// Show the model's final text before asking for input.
    fn present(&mut self, text: &str);

    /// Block until the operator replies.
    fn ask(&mut self) -> OperatorReply;

    fn report_error(&mut self, text: &str);
}

/// Line-based operator over any reader/writer pair.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the operator and return the writer.
    pub fn into_output(self) -> W {
        self.output
    }

    fn write_line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{}", text) {
            tracing::warn!("Failed to write operator output: {}", e);
        }
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn narrate(&mut self, text: &str) {
        self.write_line(&format!("💭 {}", text));
    }

    fn present(&mut self, text: &str) {
        self.write_line(&format!("\n{}", "=".repeat(50)));
        self.write_line("🤖 Model response:");
        self.write_line(&"-".repeat(50));
        self.write_line(text);
        self.write_line(&"=".repeat(50));
    }

    fn ask(&mut self) -> OperatorReply {
        loop {
            let _ = write!(self.output, "📝 Reply ('exit' or 'quit' to stop): ");
            let _ = self.output.flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    tracing::info!("Operator input closed");
                    return OperatorReply::Exit;
                }
                Ok(_) => {
                    if let Some(reply) = OperatorReply::from_line(&line) {
                        return reply;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read operator input: {}", e);
                    return OperatorReply::Exit;
                }
            }
        }
    }

    fn report_error(&mut self, text: &str) {
        self.write_line(&format!("\n❌ Error: {}", text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reply_from_line() {
        assert_eq!(OperatorReply::from_line("  QUIT \n"), Some(OperatorReply::Exit));
        assert_eq!(OperatorReply::from_line("Exit"), Some(OperatorReply::Exit));
        assert_eq!(OperatorReply::from_line("\n"), None);
        assert_eq!(
            OperatorReply::from_line(" open mail \n"),
            Some(OperatorReply::Message("open mail".to_string()))
        );
        assert_eq!(
            OperatorReply::from_line("exit now"),
            Some(OperatorReply::Message("exit now".to_string()))
        );
    }

    #[test]
    fn test_console_skips_blank_lines() {
        let mut operator = ConsoleOperator::new(Cursor::new("\n   \nnext step\n"), Vec::new());
        assert_eq!(operator.ask(), OperatorReply::Message("next step".to_string()));
    }

    #[test]
    fn test_console_eof_exits() {
        let mut operator = ConsoleOperator::new(Cursor::new(""), Vec::new());
        assert_eq!(operator.ask(), OperatorReply::Exit);
    }

    #[test]
    fn test_console_present_and_errors() {
        let mut operator = ConsoleOperator::new(Cursor::new(""), Vec::new());
        operator.narrate("working on it");
        operator.present("Done.");
        operator.report_error("API error (500): overloaded");

        let output = String::from_utf8(operator.into_output()).unwrap();
        assert!(output.contains("💭 working on it"));
        assert!(output.contains("Model response:"));
        assert!(output.contains("Done."));
        assert!(output.contains("❌ Error: API error (500): overloaded"));
    }
}
