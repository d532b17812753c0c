use super::{UIError, UIMessage, UserInterface};
use async_trait::async_trait;
use crossterm::style::{Color, Stylize};
use rustyline::{error::ReadlineError, history::DefaultHistory, Config, Editor};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub struct TerminalUI {
    line_editor: Arc<Mutex<Editor<(), DefaultHistory>>>,
    // Only set in tests; production output goes to stdout
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
}

fn create_editor() -> Result<Editor<(), DefaultHistory>, UIError> {
    let config = Config::builder()
        .edit_mode(rustyline::EditMode::Emacs)
        .auto_add_history(true)
        .build();
    Editor::with_config(config).map_err(|e| UIError::Other(e.to_string()))
}

impl TerminalUI {
    pub fn new() -> Result<Self, UIError> {
        Ok(Self {
            line_editor: Arc::new(Mutex::new(create_editor()?)),
            writer: None,
        })
    }

    #[cfg(test)]
    pub fn with_test_writer(writer: Box<dyn Write + Send>) -> Result<Self, UIError> {
        Ok(Self {
            line_editor: Arc::new(Mutex::new(create_editor()?)),
            writer: Some(Arc::new(Mutex::new(writer))),
        })
    }

    fn write_line(&self, s: &str) -> Result<(), UIError> {
        match &self.writer {
            Some(writer) => {
                let mut writer = writer
                    .lock()
                    .map_err(|_| UIError::Other("Output writer poisoned".to_string()))?;
                writeln!(writer, "{s}")?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{s}")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Tool call trace lines are dimmed so the model's own words stand out
    fn format_answer(answer: &str) -> String {
        answer
            .lines()
            .map(|line| {
                if line.starts_with("[Calling tool ") || line.starts_with("[Max iterations") {
                    line.with(Color::DarkGrey).to_string()
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl UserInterface for TerminalUI {
    async fn display(&self, message: UIMessage) -> Result<(), UIError> {
        match message {
            UIMessage::Info(text) => self.write_line(&text),
            UIMessage::Answer(answer) => {
                self.write_line(&format!("\n{}", Self::format_answer(&answer)))
            }
            UIMessage::Error(error) => {
                self.write_line(&format!("\n{} {}", "Error:".with(Color::Red).bold(), error))
            }
        }
    }

    async fn get_input(&self, prompt: &str) -> Result<String, UIError> {
        self.write_line("")?;

        let mut editor = self
            .line_editor
            .lock()
            .map_err(|_| UIError::Other("Line editor poisoned".to_string()))?;

        match editor.readline(prompt) {
            Ok(line) => Ok(line.trim().to_string()),
            // Ctrl-C and Ctrl-D
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Err(UIError::Cancelled),
            Err(ReadlineError::Io(e)) => Err(UIError::IOError(e)),
            Err(e) => Err(UIError::Other(e.to_string())),
        }
    }
}
