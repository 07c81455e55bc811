//! Parsing of REPL input into page gestures.

use std::path::PathBuf;

/// Slash commands with their argument synopsis, for completion and hints.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/signin", "<email>"),
    ("/verify", "<email> <code>"),
    ("/signout", ""),
    ("/image", "[path]"),
    ("/post", "[text]"),
    ("/like", "<n>"),
    ("/refresh", ""),
    ("/help", ""),
    ("/quit", ""),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request a sign-in code; an empty email cancels
    SignIn(String),
    Verify { email: String, code: String },
    SignOut,
    /// Select a file, or clear the selection when `None`
    Image(Option<PathBuf>),
    /// Publish, optionally replacing the draft text first
    Post(Option<String>),
    /// Like the post at this 1-based feed position
    Like(usize),
    Refresh,
    Help,
    Quit,
    /// Plain text becomes the draft content
    Draft(String),
    /// Input that could not be understood, with a hint
    Invalid(String),
}

impl Command {
    /// Parses one line of input. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Self::Draft(line.to_string()));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/signin" => Self::SignIn(rest.to_string()),
            "/verify" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(email), Some(code), None) => Self::Verify {
                        email: email.to_string(),
                        code: code.to_string(),
                    },
                    _ => Self::Invalid("usage: /verify <email> <code>".to_string()),
                }
            }
            "/signout" => Self::SignOut,
            "/image" if rest.is_empty() => Self::Image(None),
            "/image" => Self::Image(Some(PathBuf::from(rest))),
            "/post" if rest.is_empty() => Self::Post(None),
            "/post" => Self::Post(Some(rest.to_string())),
            "/like" => match rest.parse::<usize>() {
                Ok(index) if index > 0 => Self::Like(index),
                _ => Self::Invalid("usage: /like <n> (n = number shown in the feed)".to_string()),
            },
            "/refresh" => Self::Refresh,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command {other}, try /help")),
        };
        Some(command)
    }
}

pub fn help_text() -> &'static str {
    "\
/signin <email>        send a sign-in code to <email>
/verify <email> <code> sign in with the emailed code
/signout               sign out
/image [path]          attach an image to the draft (no path clears it)
/post [text]           publish the draft (text replaces the draft first)
/like <n>              like post number <n>
/refresh               reload the feed
/help                  show this help
/quit                  exit
Any other text becomes the draft."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_draft() {
        assert_eq!(
            Command::parse("  On this day in 1969...  "),
            Some(Command::Draft("On this day in 1969...".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn test_post_with_and_without_text() {
        assert_eq!(Command::parse("/post"), Some(Command::Post(None)));
        assert_eq!(
            Command::parse("/post First post"),
            Some(Command::Post(Some("First post".to_string())))
        );
    }

    #[test]
    fn test_verify_requires_email_and_code() {
        assert_eq!(
            Command::parse("/verify ada@example.com 123456"),
            Some(Command::Verify {
                email: "ada@example.com".to_string(),
                code: "123456".to_string()
            })
        );
        assert!(matches!(
            Command::parse("/verify ada@example.com"),
            Some(Command::Invalid(_))
        ));
    }

    #[test]
    fn test_like_index_must_be_positive() {
        assert_eq!(Command::parse("/like 2"), Some(Command::Like(2)));
        assert!(matches!(Command::parse("/like 0"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse("/like x"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_signin_without_email_is_cancel() {
        assert_eq!(Command::parse("/signin"), Some(Command::SignIn(String::new())));
    }

    #[test]
    fn test_image_path_and_clear() {
        assert_eq!(
            Command::parse("/image ./pics/cat.png"),
            Some(Command::Image(Some(PathBuf::from("./pics/cat.png"))))
        );
        assert_eq!(Command::parse("/image"), Some(Command::Image(None)));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(Command::parse("/dance"), Some(Command::Invalid(_))));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
    }
}
