use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use vt_relay_sdk::{ProcessMode, ProcessRequest, RelayClient};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Send requests to the vt-relay HTTP front end", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the backend how it is doing
    Status,
    /// Run a processing stack over a sound file
    Process {
        /// Sound file, as known to the backend
        #[arg(long)]
        file: String,
        /// Processing stack as a JSON array
        #[arg(long, default_value = "[]")]
        stack: String,
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
    /// Send an arbitrary JSON request
    Raw { json: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Sync,
    Async,
    Hash,
}

impl From<Mode> for ProcessMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sync => ProcessMode::Sync,
            Mode::Async => ProcessMode::Async,
            Mode::Hash => ProcessMode::Hash,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let client = RelayClient::new(&cli.url);

    let body = match cli.command {
        Commands::Status => serde_json::json!({"action": "status"}).to_string(),
        Commands::Process { file, stack, mode } => ProcessRequest {
            file,
            stack: serde_json::from_str(&stack)?,
            mode: mode.map(Into::into),
        }
        .to_value()
        .to_string(),
        Commands::Raw { json } => json,
    };

    let reply = client.send_raw(body).await?;
    print_reply(&reply)?;
    Ok(())
}

/// Pretty-print JSON replies; anything else the relay forwarded is shown verbatim.
fn print_reply(reply: &str) -> Result<(), serde_json::Error> {
    match serde_json::from_str::<Value>(reply) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => {
            eprintln!("Warning: reply is not JSON, printing it as received");
            println!("{}", reply.trim_end());
        }
    }
    Ok(())
}
