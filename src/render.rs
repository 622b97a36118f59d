//! Text rendering of a built tree with box-drawing glyphs.
//!
//! ```text
//! ┌──foo
//! ├┬─bar
//! │├──bar0
//! │└──bar1
//! └┬─baz
//!  └──baz0
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use arbor_core::{Node, TreeStats};

/// Rendering options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Maximum depth of children to print (None = unlimited).
    pub max_depth: Option<usize>,
}

/// Write the tree rooted at `root`.
pub fn render(out: &mut impl Write, root: &Arc<Node>, options: RenderOptions) -> io::Result<()> {
    writeln!(out, "┌──{}{}", root.filename(), error_marker(root))?;
    if root.error().is_none() {
        render_children(out, root, "", 1, options)?;
    }
    Ok(())
}

fn render_children(
    out: &mut impl Write,
    node: &Node,
    prefix: &str,
    depth: usize,
    options: RenderOptions,
) -> io::Result<()> {
    if options.max_depth.is_some_and(|max| depth > max) {
        return Ok(());
    }

    let children = node.children();
    let last = children.len().saturating_sub(1);
    for (i, child) in children.iter().enumerate() {
        let (branch, continuation) = if i == last { ("└", " ") } else { ("├", "│") };
        let sep = if child.is_empty() { "─" } else { "┬" };
        writeln!(
            out,
            "{prefix}{branch}{sep}─{}{}",
            child.filename(),
            error_marker(child)
        )?;

        if child.error().is_none() {
            render_children(out, child, &format!("{prefix}{continuation}"), depth + 1, options)?;
        }
    }
    Ok(())
}

fn error_marker(node: &Node) -> String {
    node.error()
        .map(|err| format!(" [error: {err}]"))
        .unwrap_or_default()
}

/// One-line summary, e.g. `2 directories, 3 files`.
pub fn summary(stats: &TreeStats) -> String {
    // The root is not counted, matching the classic tree output.
    let dirs = stats.total_dirs.saturating_sub(1);
    let mut line = format!(
        "{dirs} {}, {} {}",
        plural(dirs, "directory", "directories"),
        stats.total_files,
        plural(stats.total_files, "file", "files")
    );
    if stats.unreadable_dirs > 0 {
        line.push_str(&format!(", {} unreadable", stats.unreadable_dirs));
    }
    line
}

fn plural<'a>(n: u64, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
