//! This is the main entry point for the volume browser.
//!
//! The program provides an interactive command-line interface over raw
//! FAT32 and NTFS volume images. Users can open a volume, print its
//! geometry, list and change directories, draw the tree and print file
//! content. Everything is strictly read-only.

use fs_browser::commands::{Command, FsKind};
use fs_browser::navigator::absolute_path;
use fs_browser::tree::NodeId;
use fs_browser::{Fat32Volume, FileSystemView, Navigator, NtfsVolume, Resolved, VolumeHandle};
use log::{error, warn};
use std::io::{self, Write};
use std::path::Path;

/// Represents the runtime state of the program.
struct RunState {
    /// The currently opened volume and the cursor into its tree.
    session: Option<(Box<dyn FileSystemView>, Navigator)>,
    /// Enable boot sector validation on open.
    boot_validation: bool,
}

fn main() {
    stderrlog::new()
        .module(module_path!())
        .module("fs_browser")
        .verbosity(2)
        .init()
        .unwrap();

    let mut run_state = RunState {
        session: None,
        boot_validation: true,
    };

    print_help();
    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut s = String::new();
        io::stdin()
            .read_line(&mut s)
            .expect("Failed to read command");

        match Command::from_string(&s) {
            Command::Help => print_help(),
            Command::Open(path, kind) => open_volume(&mut run_state, &path, kind),
            Command::Info => match &run_state.session {
                Some((view, _)) => match view.display_info() {
                    Ok(info) => print!("{info}"),
                    Err(err) => error!("Info formatting failed: {err}"),
                },
                None => warn!("Open a volume first"),
            },
            Command::List => match &run_state.session {
                Some((view, nav)) => list_dir(view.as_ref(), nav.current()),
                None => warn!("Open a volume first"),
            },
            Command::ChangeDir(path) => change_dir(&mut run_state, &path),
            Command::Print(path) => print_file(&mut run_state, &path),
            Command::Tree => match &run_state.session {
                Some((view, nav)) => {
                    println!("{}", view.meta(nav.current()).name);
                    draw_tree(view.as_ref(), nav.current(), 0);
                }
                None => warn!("Open a volume first"),
            },
            Command::Skip => run_state.boot_validation = false,
            Command::Quit => break,
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
        }
    }
}

fn print_help() {
    println!("List of all commands:");
    println!("  help                  List all commands");
    println!("  open <image> <fs>     Open a volume image ('fat32' or 'ntfs')");
    println!("  info                  Print volume information");
    println!("  ls                    List the current working directory");
    println!("  cd <path>             Change the current working directory");
    println!("  cat <path>            Print a file's content");
    println!("  tree                  Draw the tree under the working directory");
    println!("  skip                  Disable boot sector validation");
    println!("  quit                  Exit the program");
}

fn open_volume(run_state: &mut RunState, path: &str, kind: FsKind) {
    let handle = match VolumeHandle::from_file(Path::new(path)) {
        Ok(handle) => handle,
        Err(err) => {
            error!("Failed to open {path}: {err}");
            return;
        }
    };

    let view: Box<dyn FileSystemView> = match kind {
        FsKind::Fat32 => match Fat32Volume::open(handle, run_state.boot_validation) {
            Ok(volume) => Box::new(volume),
            Err(err) => {
                error!("{err}");
                return;
            }
        },
        FsKind::Ntfs => match NtfsVolume::open(handle) {
            Ok(volume) => Box::new(volume),
            Err(err) => {
                error!("{err}");
                return;
            }
        },
    };

    let navigator = Navigator::new(view.root());
    run_state.session = Some((view, navigator));
    println!("Opened {path}.");
}

fn change_dir(run_state: &mut RunState, path: &str) {
    let Some((view, nav)) = run_state.session.as_mut() else {
        warn!("Open a volume first");
        return;
    };

    match nav.resolve(view.as_ref(), path) {
        Ok(Resolved::Directory(_)) => {
            println!(
                "Current working directory: {}",
                absolute_path(view.as_ref(), nav.current())
            );
        }
        Ok(Resolved::File(_)) => error!("{path} is not a directory"),
        Err(err) => error!("{err}"),
    }
}

fn print_file(run_state: &mut RunState, path: &str) {
    let Some((view, nav)) = run_state.session.as_mut() else {
        warn!("Open a volume first");
        return;
    };

    // Probe on a copy of the cursor so `cat somedir` cannot move it.
    let mut probe = nav.clone();
    let node = match probe.resolve(view.as_ref(), path) {
        Ok(Resolved::File(node)) => node,
        Ok(Resolved::Directory(_)) => {
            error!("{path} is a directory");
            return;
        }
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let name = view.meta(node).name.clone();
    match view.read_file(node) {
        Ok(content) => present_content(&name, &content),
        Err(err) => error!("Failed to read {path}: {err}"),
    }
}

/// Prints text files directly; for other known kinds, points the user at
/// an appropriate program instead of dumping bytes on the terminal.
fn present_content(name: &str, content: &[u8]) {
    let lower = name.to_lowercase();
    let guidance = [
        (".docx", "Please use MS Word to open this file!"),
        (".pdf", "Please use Adobe Acrobat Reader to open this file!"),
        (".png", "Please use an image viewer to open this file!"),
        (".jpg", "Please use an image viewer to open this file!"),
        (".jpeg", "Please use an image viewer to open this file!"),
        (".gif", "Please use an image viewer to open this file!"),
        (".mp4", "Please use a video player to open this file!"),
        (".mp3", "Please use a music player to open this file!"),
        (".cpp", "Please use a code editor to open this file!"),
        (".c", "Please use a code editor to open this file!"),
        (".java", "Please use a code editor to open this file!"),
    ];

    if lower.ends_with(".txt") {
        println!("{}", String::from_utf8_lossy(content));
        return;
    }
    for (ext, message) in guidance {
        if lower.ends_with(ext) {
            println!("{message}");
            return;
        }
    }
    println!("Please use an appropriate program to open this file!");
}

fn list_dir(view: &dyn FileSystemView, current: NodeId) {
    println!(
        "{:<8} | {:<12} | {:<12} | {:<10} | {:<9} | {:<30}",
        "Index", "Type", "Date", "Time", "Size(B)", "Name"
    );
    println!("{}", "-".repeat(8 + 12 + 12 + 10 + 9 + 30 + 15));

    let mut index = 0;
    if view.parent(current).is_some() {
        index += 1;
        println!(
            "{:<8} | {:<12} | {:<12} | {:<10} | {:<9} | {:<30}",
            index, "directory", "", "", "", "/.."
        );
    }

    // Directories first, then files.
    for pass in [true, false] {
        for &child in view.children(current) {
            let meta = view.meta(child);
            if meta.is_dir() != pass {
                continue;
            }
            index += 1;
            let (date, time) = match meta.created {
                Some(ts) => (
                    ts.format("%Y-%m-%d").to_string(),
                    ts.format("%H:%M:%S").to_string(),
                ),
                None => (String::new(), String::new()),
            };
            let (kind, size, name) = if meta.is_dir() {
                ("directory", String::new(), format!("/{}", meta.name))
            } else {
                ("file", meta.size.to_string(), meta.name.clone())
            };
            println!(
                "{:<8} | {:<12} | {:<12} | {:<10} | {:<9} | {:<30}",
                index, kind, date, time, size, name
            );
        }
    }
}

fn draw_tree(view: &dyn FileSystemView, node: NodeId, depth: usize) {
    for &child in view.children(node) {
        println!("├─{}{}", "──".repeat(depth), view.meta(child).name);
        if view.meta(child).is_dir() {
            draw_tree(view, child, depth + 1);
        }
    }
}
