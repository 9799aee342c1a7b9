//! This module defines the `Command` enum and its associated methods for
//! parsing user commands in the volume browser.
//!
//! The `Command` enum represents the commands the user can input, such as
//! opening a volume image, listing the current directory, changing
//! directory, printing a file, or handling invalid and unknown input.

/// Which engine to open a volume with. Filesystem detection through host
/// OS APIs is outside this tool; the user names the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsKind {
    Fat32,
    Ntfs,
}

/// Represents a user command in the volume browser.
#[derive(Debug)]
pub enum Command {
    /// Print the list of commands.
    Help,
    /// Open a volume image with the named filesystem engine.
    Open(String, FsKind),
    /// Print volume geometry information.
    Info,
    /// List the current directory.
    List,
    /// Change the current directory.
    ChangeDir(String),
    /// Print a file's content.
    Print(String),
    /// Draw the tree under the current directory.
    Tree,
    /// Skip boot sector validation on subsequent opens.
    Skip,
    /// Quit the program.
    Quit,
    /// Command for an unknown input, encapsulating the raw input.
    Unknown(String),
    /// Command for invalid input, encapsulating an error message.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a string into a `Command` instance.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.trim().split_whitespace();
        match parts.next() {
            Some("help") => Command::Help,
            Some("open") => match (parts.next(), parts.next()) {
                (Some(path), Some(fs)) => match fs {
                    "fat32" => Command::Open(path.to_string(), FsKind::Fat32),
                    "ntfs" => Command::Open(path.to_string(), FsKind::Ntfs),
                    other => Command::Invalid(format!(
                        "Unknown filesystem {other:?}: 'open' expects 'fat32' or 'ntfs'."
                    )),
                },
                _ => Command::Invalid(String::from(
                    "Missing arg: 'open' expects the path to a volume image and the filesystem ('fat32' or 'ntfs').",
                )),
            },
            Some("info") => Command::Info,
            Some("ls") => Command::List,
            Some("cd") => match parts.next() {
                Some(path) => Command::ChangeDir(path.to_string()),
                None => Command::Invalid(String::from("Missing arg: 'cd' expects a path.")),
            },
            Some("cat") => match parts.next() {
                Some(path) => Command::Print(path.to_string()),
                None => Command::Invalid(String::from("Missing arg: 'cat' expects a path.")),
            },
            Some("tree") => Command::Tree,
            Some("skip") => Command::Skip,
            Some("quit") => Command::Quit,
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_with_engine() {
        assert!(matches!(
            Command::from_string("open disk.img fat32"),
            Command::Open(path, FsKind::Fat32) if path == "disk.img"
        ));
        assert!(matches!(
            Command::from_string("open disk.img ntfs"),
            Command::Open(_, FsKind::Ntfs)
        ));
        assert!(matches!(
            Command::from_string("open disk.img ext4"),
            Command::Invalid(_)
        ));
        assert!(matches!(
            Command::from_string("open"),
            Command::Invalid(_)
        ));
    }

    #[test]
    fn parses_navigation_commands() {
        assert!(matches!(
            Command::from_string("cd /DOCS"),
            Command::ChangeDir(path) if path == "/DOCS"
        ));
        assert!(matches!(
            Command::from_string("cat /DOCS/A.TXT"),
            Command::Print(path) if path == "/DOCS/A.TXT"
        ));
        assert!(matches!(Command::from_string("ls"), Command::List));
        assert!(matches!(Command::from_string("  "), Command::Empty));
        assert!(matches!(
            Command::from_string("frobnicate"),
            Command::Unknown(_)
        ));
    }
}
