//! CLI command implementations

pub mod compose;


/// Split a command line such as `docker compose` into its words.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
