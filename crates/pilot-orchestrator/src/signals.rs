//! Detection of the oracle's hand-back signals.

/// The pause phrase the task protocol reserves for "run the above and
/// give me the output" — the oracle handing control back, not an error.
pub const PAUSE_PHRASE: &str = "please run the above and paste the output";

/// True when the response contains the pause phrase.
pub fn is_pause_request(text: &str) -> bool {
    text.to_lowercase().contains(PAUSE_PHRASE)
}

/// True when every non-blank line starts with the comment marker `#` —
/// the oracle is asking a question or signaling completion rather than
/// issuing a command.
pub fn all_lines_are_comments(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .all(|line| line.starts_with('#'))
}

/// Split the oracle's launch response into an argument vector.
pub fn tokenize_launch_line(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_request() {
        assert!(is_pause_request(
            "# Please run the above and paste the output so I can continue."
        ));
        assert!(!is_pause_request("ls -la"));
    }

    #[test]
    fn test_all_lines_are_comments() {
        assert!(all_lines_are_comments("# What is the next goal?"));
        assert!(all_lines_are_comments("# done\n\n# really done"));
        assert!(!all_lines_are_comments("ls -la"));
        assert!(!all_lines_are_comments("# setup\napt-get update"));
    }

    #[test]
    fn test_plain_command_is_neither_signal() {
        let text = "ls -la";
        assert!(!is_pause_request(text));
        assert!(!all_lines_are_comments(text));
    }

    #[test]
    fn test_tokenize_launch_line() {
        assert_eq!(
            tokenize_launch_line("docker run --rm -i --name temp-shell alpine:3.19 /bin/sh"),
            vec![
                "docker",
                "run",
                "--rm",
                "-i",
                "--name",
                "temp-shell",
                "alpine:3.19",
                "/bin/sh"
            ]
        );
    }

    #[test]
    fn test_tokenize_collapses_whitespace_and_newlines() {
        assert_eq!(
            tokenize_launch_line("docker  run\n-i ubuntu /bin/bash\n"),
            vec!["docker", "run", "-i", "ubuntu", "/bin/bash"]
        );
        assert!(tokenize_launch_line("   \n ").is_empty());
    }
}
