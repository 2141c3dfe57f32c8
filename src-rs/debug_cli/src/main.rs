mod backend;
mod cli;
mod client;
mod commands;
mod render;
mod repl;

use std::time::Duration;

use willow_agent_rs::logging::init_file_logging;
use willow_agent_rs::{Agent, AppConfig};

use backend::LocalBackend;
use client::HTTPClient;
use repl::REPL;

fn main() {
    let cli = cli::parse_config();
    let wait = Duration::from_secs(cli.wait_secs);

    if cli.local {
        if let Err(err) = init_file_logging(&cli.config.log_file, cli.config.verbose) {
            render::error(&format!("logging disabled: {}", err));
        }
        let agent = Agent::new(AppConfig::load(&cli.config.paths()));
        if agent.configured_providers().is_empty() {
            render::error("no API keys configured; set OPENAI_API_KEY or GEMINI_API_KEY");
        }
        let mut repl = REPL::new(LocalBackend::new(agent), "in-process", wait);
        repl.run();
    } else {
        let client = HTTPClient::new(&cli.base);
        let target = client.base_url.clone();
        let mut repl = REPL::new(client, &target, wait);
        repl.run();
    }
}
