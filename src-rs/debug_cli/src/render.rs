use std::io::{self, Write};

use serde_json::Value;

use willow_agent_rs::task::{Task, TaskId};
use willow_agent_rs::AskResult;

pub fn banner(target: &str) {
    println!("Willow AI Assistant (test-mode CLI)");
    println!("Agent: {}", target);
    println!("Type 'help' for commands, 'exit' or 'quit' to end.");
}

pub fn prompt() {
    print!("willow> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  ask <prompt>                       Answer directly, with fallback");
    println!("  submit <prompt>                    Run in the background, with fallback");
    println!("  submit-to <openai|gemini> <prompt> Run in the background on one provider");
    println!("  status <task_id>                   Show task status and result");
    println!("  wait <task_id>                     Block until the task finishes");
    println!("  tasks [limit]                      List recent tasks");
    println!("  settings                           Show current settings");
    println!("  exit | quit                        Leave");
}

pub fn answer(result: &AskResult) {
    if let Some(err) = &result.error {
        println!("error: {}", err);
        return;
    }
    match result.provider {
        Some(provider) => println!("[{}] {}", provider, result.output),
        None => println!("{}", result.output),
    }
}

pub fn submitted(id: TaskId) {
    println!("submitted task {}", id);
}

pub fn task(task: &Task) {
    println!("[task {}] {}", task.id, task.status);
    println!("  description: {}", task.description);
    println!("  route: {}", task.route);
    if let Some(provider) = task.provider {
        println!("  provider: {}", provider);
    }
    if let Some(result) = &task.result {
        println!("  result: {}", result);
    }
    if let Some(error) = &task.error {
        println!("  error: {}", error);
    }
}

pub fn tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        println!("[{}] {} - {}", task.status, task.id, task.description);
    }
}

pub fn settings(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
