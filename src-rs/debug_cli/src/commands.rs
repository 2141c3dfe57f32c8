use willow_agent_rs::llm::Provider;
use willow_agent_rs::task::TaskId;

const DEFAULT_TASK_LIMIT: usize = 10;

#[derive(Debug, PartialEq)]
pub enum Command {
    Ask(String),
    Submit(String),
    SubmitTo(Provider, String),
    Status(TaskId),
    Wait(TaskId),
    Tasks(usize),
    Settings,
    Help,
    Exit,
}

/// Parses one REPL line. Prompts keep their inner spacing.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    match cmd.to_lowercase().as_str() {
        "exit" | "quit" => Ok(Command::Exit),
        "help" => Ok(Command::Help),
        "settings" => Ok(Command::Settings),
        "ask" => prompt(rest, "ask <prompt>").map(Command::Ask),
        "submit" => prompt(rest, "submit <prompt>").map(Command::Submit),
        "submit-to" => {
            let usage = "submit-to <openai|gemini> <prompt>";
            let (provider, text) = rest.split_once(char::is_whitespace)
                .ok_or_else(|| format!("usage: {}", usage))?;
            let provider = provider.parse::<Provider>().map_err(|err| err.to_string())?;
            Ok(Command::SubmitTo(provider, prompt(text, usage)?))
        }
        "status" => task_id(rest, "status <task_id>").map(Command::Status),
        "wait" => task_id(rest, "wait <task_id>").map(Command::Wait),
        "tasks" => {
            if rest.is_empty() {
                return Ok(Command::Tasks(DEFAULT_TASK_LIMIT));
            }
            rest.parse::<usize>()
                .map(Command::Tasks)
                .map_err(|_| "usage: tasks [limit]".to_string())
        }
        _ => Err("unknown command, type help".to_string()),
    }
}

fn prompt(rest: &str, usage: &str) -> Result<String, String> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(format!("usage: {}", usage));
    }
    Ok(rest.to_string())
}

fn task_id(rest: &str, usage: &str) -> Result<TaskId, String> {
    if rest.is_empty() {
        return Err(format!("usage: {}", usage));
    }
    rest.parse::<TaskId>().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompts_with_spaces() {
        assert_eq!(
            parse_command("ask  what is   rust?"),
            Ok(Command::Ask("what is   rust?".to_string()))
        );
        assert_eq!(
            parse_command("submit tell me a story"),
            Ok(Command::Submit("tell me a story".to_string()))
        );
    }

    #[test]
    fn parses_pinned_submission() {
        assert_eq!(
            parse_command("submit-to gemini summarize this"),
            Ok(Command::SubmitTo(Provider::Gemini, "summarize this".to_string()))
        );
        assert!(parse_command("submit-to claude hi").is_err());
        assert!(parse_command("submit-to openai").is_err());
    }

    #[test]
    fn parses_task_commands() {
        assert_eq!(parse_command("status 3"), Ok(Command::Status(TaskId::new(3))));
        assert_eq!(parse_command("WAIT 4"), Ok(Command::Wait(TaskId::new(4))));
        assert_eq!(parse_command("tasks"), Ok(Command::Tasks(10)));
        assert_eq!(parse_command("tasks 2"), Ok(Command::Tasks(2)));
        assert!(parse_command("status x").is_err());
        assert!(parse_command("status").is_err());
    }

    #[test]
    fn rejects_unknown_and_empty_prompts() {
        assert!(parse_command("ask").is_err());
        assert!(parse_command("dance").is_err());
        assert_eq!(parse_command("quit"), Ok(Command::Exit));
    }
}
