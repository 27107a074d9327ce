use crate::server::ServerHandle;
use throughput_logger::{log, LogSeverity::{Error, Info, Warning}};
use throughput_pipeline::CommandOutcome;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// A line typed on the operator console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand<'a> {
    Empty,
    /// Prints the active pipeline and the number of connected clients.
    Status,
    /// Disables the plugin and shuts the server down.
    Stop,
    /// Anything else is offered to the plugin.
    Plugin { name: &'a str, args: Vec<&'a str> },
}

impl<'a> ConsoleCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim().trim_start_matches('/');
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return ConsoleCommand::Empty;
        };

        if name.eq_ignore_ascii_case("status") {
            ConsoleCommand::Status
        } else if name.eq_ignore_ascii_case("stop") {
            ConsoleCommand::Stop
        } else {
            ConsoleCommand::Plugin {
                name,
                args: words.collect(),
            }
        }
    }
}

/// Runs one console command. Returns false once the server is stopping.
pub async fn execute(handle: &ServerHandle, command: ConsoleCommand<'_>) -> bool {
    match command {
        ConsoleCommand::Empty => {}
        ConsoleCommand::Status => match handle.mode().await {
            Some(mode) => log(
                format!("Using {} packet listener, {} clients online", mode, handle.online()),
                Info,
            ),
            None => log("Throughput plugin is disabled".to_owned(), Info),
        },
        ConsoleCommand::Stop => {
            handle.shutdown();
            return false;
        }
        ConsoleCommand::Plugin { name, args } => match handle.command(name, &args).await {
            CommandOutcome::NotHandled => log(format!("Unknown command: {}", name), Warning),
            CommandOutcome::Switched(mode) => {
                log(format!("Changed packet listener to {}", mode), Info)
            }
            CommandOutcome::Failed(err) => log(format!("Command {} failed: {}", name, err), Error),
        },
    }
    true
}

/// Reads operator commands from stdin until `stop` or end of input.
pub async fn run_console(handle: ServerHandle) {
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !execute(&handle, ConsoleCommand::parse(&line)).await {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                log(format!("Failed to read console input: {}", err), Error);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Empty);
        assert_eq!(ConsoleCommand::parse("STATUS"), ConsoleCommand::Status);
        assert_eq!(ConsoleCommand::parse("/stop"), ConsoleCommand::Stop);
        assert_eq!(
            ConsoleCommand::parse("throughput now please"),
            ConsoleCommand::Plugin {
                name: "throughput",
                args: vec!["now", "please"]
            }
        );
    }
}
