//! Path resolution and the current-directory cursor.

use thiserror::Error;

use crate::traits::FileSystemView;
use crate::tree::NodeId;
use crate::utils::normalize_name;

/// Errors reported by path resolution. Never fatal: the cursor is left
/// untouched whenever resolution fails.
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Path not found: `{0}`")]
    PathNotFound(String),

    #[error("`{0}` is not a directory")]
    NotADirectory(String),
}

/// What a successfully resolved path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// A regular file. Resolving a file never moves the cursor.
    File(NodeId),
    /// A directory. The cursor has been moved onto it.
    Directory(NodeId),
}

/// Movable cursor into a [`FileSystemView`] tree.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: NodeId,
}

impl Navigator {
    pub fn new(root: NodeId) -> Self {
        Self { current: root }
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Puts the cursor back on the root.
    pub fn reset(&mut self, root: NodeId) {
        self.current = root;
    }

    /// Resolves a slash- or backslash-delimited path.
    ///
    /// A leading separator anchors resolution at the root, otherwise it
    /// starts at the current node. Each segment is matched
    /// case-insensitively (NULs stripped) against the children's display
    /// and short names. A file match must be the final segment; a
    /// directory match at the final segment moves the cursor.
    pub fn resolve<V: FileSystemView + ?Sized>(
        &mut self,
        view: &V,
        path: &str,
    ) -> Result<Resolved, NavError> {
        let absolute = path.starts_with('/') || path.starts_with('\\');
        let segments: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();

        if segments.is_empty() {
            if absolute {
                self.current = view.root();
                return Ok(Resolved::Directory(self.current));
            }
            return Err(NavError::PathNotFound(path.to_string()));
        }

        let mut cursor = if absolute { view.root() } else { self.current };

        for (depth, segment) in segments.iter().enumerate() {
            let wanted = normalize_name(segment).to_lowercase();
            let is_last = depth == segments.len() - 1;

            let matched = view
                .children(cursor)
                .iter()
                .copied()
                .find(|child| Self::name_matches(view, *child, &wanted));

            let child = match matched {
                Some(child) => child,
                None => return Err(NavError::PathNotFound(path.to_string())),
            };

            if view.meta(child).is_dir() {
                cursor = child;
            } else if is_last {
                return Ok(Resolved::File(child));
            } else {
                return Err(NavError::NotADirectory(segment.to_string()));
            }
        }

        self.current = cursor;
        Ok(Resolved::Directory(cursor))
    }

    fn name_matches<V: FileSystemView + ?Sized>(view: &V, node: NodeId, wanted: &str) -> bool {
        let meta = view.meta(node);
        if normalize_name(&meta.name).to_lowercase() == wanted {
            return true;
        }
        meta.alt_name
            .as_deref()
            .is_some_and(|alt| normalize_name(alt).to_lowercase() == wanted)
    }
}

/// Absolute path of a node, built by walking the parent edges. The root
/// renders as `/`; its name is not part of the path.
pub fn absolute_path<V: FileSystemView + ?Sized>(view: &V, node: NodeId) -> String {
    let mut parts = Vec::new();
    let mut cursor = node;
    while let Some(parent) = view.parent(cursor) {
        parts.push(view.meta(cursor).name.clone());
        cursor = parent;
    }
    if parts.is_empty() {
        return "/".to_string();
    }
    parts.reverse();
    format!("/{}", parts.join("/"))
}
