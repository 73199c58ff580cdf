/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    SelectModel(String),
    ListModels,
    Clear,
    ToggleTheme,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /models        list available models
  /model <id>    switch model for the next prompt
  /clear         clear the conversation
  /theme         toggle light/dark colours
  /help          show this help
  /quit          exit
Anything else is sent as a prompt. Ctrl-C stops a streaming reply.";

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Prompt(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "model" if !arg.is_empty() => Command::SelectModel(arg.to_string()),
        "model" | "models" => Command::ListModels,
        "clear" => Command::Clear,
        "theme" => Command::ToggleTheme,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};

    #[test]
    fn plain_text_is_a_prompt() {
        assert_eq!(
            parse_command("  explain lifetimes\n"),
            Command::Prompt("  explain lifetimes".to_string())
        );
    }

    #[test]
    fn blank_lines_are_empty() {
        assert_eq!(parse_command("   \t"), Command::Empty);
    }

    #[test]
    fn commands_are_recognised() {
        assert_eq!(
            parse_command("/model mistral"),
            Command::SelectModel("mistral".to_string())
        );
        assert_eq!(parse_command("/model"), Command::ListModels);
        assert_eq!(parse_command("/MODELS"), Command::ListModels);
        assert_eq!(parse_command("/clear"), Command::Clear);
        assert_eq!(parse_command("/theme"), Command::ToggleTheme);
        assert_eq!(parse_command("/q"), Command::Quit);
        assert_eq!(
            parse_command("/frobnicate now"),
            Command::Unknown("/frobnicate now".to_string())
        );
    }
}
