use std::sync::Arc;

use clap::Parser;

use willow_agent_rs::api::AgentServer;
use willow_agent_rs::logging::init_file_logging;
use willow_agent_rs::{Agent, AppConfig, ConfigArgs};

#[derive(Parser)]
#[command(name = "willow", version, about = "Willow assistant API server")]
struct Cli {
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_file_logging(&cli.config.log_file, cli.config.verbose) {
        eprintln!("logging disabled: {}", err);
    }

    // Provider clients block on their own runtime, so they are built before
    // the server runtime starts and outlive it.
    let agent = Arc::new(Agent::new(AppConfig::load(&cli.config.paths())));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {}", err);
            std::process::exit(1);
        }
    };

    let server = AgentServer::new(cli.port, Arc::clone(&agent));
    println!("willow listening on :{}", cli.port);
    if let Err(err) = runtime.block_on(server.start()) {
        eprintln!("server error: {}", err);
        std::process::exit(1);
    }
}
