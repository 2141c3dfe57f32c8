use clap::Parser;

use willow_agent_rs::ConfigArgs;

const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Parser, Debug)]
#[command(name = "willow-cli", version, about = "Willow test-mode CLI")]
pub struct Cli {
    /// API server to talk to
    #[arg(long, env = "WILLOW_URL", default_value = DEFAULT_URL)]
    pub base: String,

    /// Run the agent in-process instead of calling a server
    #[arg(long)]
    pub local: bool,

    /// Seconds `wait` polls before giving up
    #[arg(long, default_value_t = 60)]
    pub wait_secs: u64,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn parse_config() -> Cli {
    Cli::parse()
}
