use std::io;
use std::time::Duration;

use crate::backend::{wait_for, Backend};
use crate::commands::{parse_command, Command};
use crate::render;

pub struct REPL<B: Backend> {
    pub backend: B,
    pub target: String,
    pub wait: Duration,
}

impl<B: Backend> REPL<B> {
    pub fn new(backend: B, target: &str, wait: Duration) -> Self {
        Self {
            backend,
            target: target.to_string(),
            wait,
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.target);
        loop {
            render::prompt();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.handle(line) {
                break;
            }
        }
    }

    /// Runs one line; returns true when the session should end.
    pub fn handle(&mut self, line: &str) -> bool {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => {
                render::error(&err);
                return false;
            }
        };
        match command {
            Command::Exit => return true,
            Command::Help => render::help(),
            Command::Ask(prompt) => match self.backend.ask(&prompt) {
                Ok(result) => render::answer(&result),
                Err(err) => render::error(&err),
            },
            Command::Submit(prompt) => self.submit(&prompt, None),
            Command::SubmitTo(provider, prompt) => self.submit(&prompt, Some(provider)),
            Command::Status(id) => match self.backend.status(id) {
                Ok(task) => render::task(&task),
                Err(err) => render::error(&err),
            },
            Command::Wait(id) => match wait_for(&self.backend, id, self.wait) {
                Ok(task) => render::task(&task),
                Err(err) => render::error(&err),
            },
            Command::Tasks(limit) => match self.backend.list_tasks(limit) {
                Ok(tasks) => render::tasks(&tasks),
                Err(err) => render::error(&err),
            },
            Command::Settings => match self.backend.settings() {
                Ok(value) => render::settings(&value),
                Err(err) => render::error(&err),
            },
        }
        false
    }

    fn submit(&self, prompt: &str, provider: Option<willow_agent_rs::llm::Provider>) {
        match self.backend.submit(prompt, provider) {
            Ok(id) => render::submitted(id),
            Err(err) => render::error(&err),
        }
    }
}
