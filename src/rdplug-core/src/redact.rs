//! Redaction helpers for keeping credentials out of logs.

use std::borrow::Cow;

const REDACTED: &str = "[REDACTED]";

/// Profile keys whose values are secret-backed.
const SECRET_KEYS: &[&str] = &["password"];

/// Client flags whose following argument is a credential.
const SECRET_FLAGS: &[&str] = &["-p"];

pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

/// Redact credential values from a client command line.
///
/// The flag itself is kept so the log still shows that a password was passed.
///
/// ```
/// use rdplug_core::redact::redact_argv;
///
/// let argv = ["rdesktop", "-u", "alice", "-p", "s3cret", "host"].map(String::from);
/// let shown = redact_argv(&argv);
/// assert_eq!(shown, ["rdesktop", "-u", "alice", "-p", "[REDACTED]", "host"]);
/// ```
pub fn redact_argv(argv: &[String]) -> Vec<Cow<'_, str>> {
    let mut out = Vec::with_capacity(argv.len());
    let mut hide_next = false;
    for arg in argv {
        if hide_next {
            out.push(Cow::Borrowed(REDACTED));
            hide_next = false;
            continue;
        }
        hide_next = SECRET_FLAGS.contains(&arg.as_str());
        out.push(Cow::Borrowed(arg.as_str()));
    }
    out
}

/// Render a command line for a single log field.
pub fn display_argv(argv: &[String]) -> String {
    redact_argv(argv).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hides_password_value_only() {
        let args = argv(&["rdesktop", "-p", "hunter2", "-z", "srv"]);
        let shown = display_argv(&args);
        assert_eq!(shown, "rdesktop -p [REDACTED] -z srv");
    }

    #[test]
    fn trailing_flag_without_value_is_kept() {
        let args = argv(&["rdesktop", "-p"]);
        assert_eq!(redact_argv(&args), ["rdesktop", "-p"]);
    }

    #[test]
    fn leaves_other_arguments_untouched() {
        let args = argv(&["rdesktop", "-u", "alice", "-g", "1024x768", "srv"]);
        assert_eq!(display_argv(&args), "rdesktop -u alice -g 1024x768 srv");
    }

    #[test]
    fn password_is_a_secret_key() {
        assert!(is_secret_key("password"));
        assert!(!is_secret_key("username"));
    }
}
