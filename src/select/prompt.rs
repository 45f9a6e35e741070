// SSHE — Operator Prompts
//
// Every question the CLI asks goes through `Prompter`, so command flows can be
// driven by scripted answers in tests. The terminal implementation blocks on
// stdin with no timeout.

use std::io::{self, BufRead, Write};

use zeroize::Zeroizing;

pub trait Prompter {
    /// Show an informational line to the operator.
    fn notify(&mut self, message: &str);

    /// Ask a question and return the trimmed answer (empty if the operator
    /// just pressed enter).
    fn ask(&mut self, question: &str) -> io::Result<String>;

    /// Ask for a secret without echoing it.
    fn ask_secret(&mut self, question: &str) -> io::Result<Zeroizing<String>>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", question)?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn ask_secret(&mut self, question: &str) -> io::Result<Zeroizing<String>> {
        rpassword::prompt_password(question).map(Zeroizing::new)
    }
}

// ─── Scripted Mock for Testing ───────────────────────────────────────────────

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;

    /// Answers questions from a queue and records everything shown.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<String>,
        pub transcript: Vec<String>,
        pub questions: usize,
    }

    impl ScriptedPrompter {
        pub fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                transcript: Vec::new(),
                questions: 0,
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.len()
        }

        pub fn saw(&self, needle: &str) -> bool {
            self.transcript.iter().any(|line| line.contains(needle))
        }

        fn next_answer(&mut self, question: &str) -> io::Result<String> {
            self.questions += 1;
            self.transcript.push(question.to_string());
            self.answers.pop_front().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "script ran out of answers")
            })
        }
    }

    impl Prompter for ScriptedPrompter {
        fn notify(&mut self, message: &str) {
            self.transcript.push(message.to_string());
        }

        fn ask(&mut self, question: &str) -> io::Result<String> {
            self.next_answer(question).map(|a| a.trim().to_string())
        }

        fn ask_secret(&mut self, question: &str) -> io::Result<Zeroizing<String>> {
            self.next_answer(question).map(Zeroizing::new)
        }
    }
}
