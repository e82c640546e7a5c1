//! Process argument handling.
//!
//! Only `--root <path>` is interpreted; it moves the directory holding the
//! settings file and the storage areas. Every other argument, and a trailing
//! `--root` with no value, is passed through to the application in order.

use std::path::PathBuf;

pub const ROOT_FLAG: &str = "--root";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchArgs {
    /// `--root` override, if given.
    pub root: Option<PathBuf>,
    /// Arguments for the application.
    pub passthrough: Vec<String>,
}

impl LaunchArgs {
    /// Parses arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut root = None;
        let mut passthrough = Vec::new();
        let mut iter = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = iter.next() {
            if arg == ROOT_FLAG {
                if let Some(value) = iter.next_if(|next| !next.starts_with("--")) {
                    root = Some(PathBuf::from(value));
                    continue;
                }
            }
            passthrough.push(arg);
        }

        Self { root, passthrough }
    }

    /// Arguments of the running process.
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Root directory: the override, else `fallback`.
    pub fn root_or(&self, fallback: impl Into<PathBuf>) -> PathBuf {
        self.root.clone().unwrap_or_else(|| fallback.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_extracted_and_the_rest_passes_through() {
        let args = LaunchArgs::parse(["-v", "--root", "/opt/app", "extra"]);
        assert_eq!(args.root, Some(PathBuf::from("/opt/app")));
        assert_eq!(args.passthrough, vec!["-v", "extra"]);
    }

    #[test]
    fn root_without_value_is_passed_through() {
        let args = LaunchArgs::parse(["run", "--root"]);
        assert_eq!(args.root, None);
        assert_eq!(args.passthrough, vec!["run", "--root"]);

        let args = LaunchArgs::parse(["--root", "--verbose"]);
        assert_eq!(args.root, None);
        assert_eq!(args.passthrough, vec!["--root", "--verbose"]);
    }

    #[test]
    fn fallback_root() {
        let args = LaunchArgs::default();
        assert_eq!(args.root_or("/data"), PathBuf::from("/data"));
    }
}
