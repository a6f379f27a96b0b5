//! Draws the `Directory structure:` section from the accepted file paths.

use std::collections::BTreeMap;

const EMPTY_TREE_LINE: &str = "(No processable files found)";

/// A node of the tree built from accepted paths. Children are kept in a
/// `BTreeMap`, so every level is already sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File,
    Directory(BTreeMap<String, TreeNode>),
}

impl TreeNode {
    pub fn empty_directory() -> Self {
        TreeNode::Directory(BTreeMap::new())
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }

    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        match self {
            TreeNode::Directory(children) => Some(children),
            TreeNode::File => None,
        }
    }

    /// Returns the children, turning a file node into an empty directory first.
    fn children_mut(&mut self) -> &mut BTreeMap<String, TreeNode> {
        if let TreeNode::File = self {
            *self = TreeNode::empty_directory();
        }
        match self {
            TreeNode::Directory(children) => children,
            TreeNode::File => unreachable!("file node was just promoted"),
        }
    }
}

/// Builds and renders the tree of accepted paths.
///
/// Stateless; everything is an associated function.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Builds a tree from slash-separated relative paths.
    ///
    /// Paths are inserted in sorted order. When a name is first seen as a file
    /// and a later path needs it as a directory, it becomes a directory. A file
    /// path that collides with an existing directory leaves the directory in place.
    pub fn build<S: AsRef<str>>(paths: &[S]) -> TreeNode {
        let mut sorted: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();

        let mut root = TreeNode::empty_directory();
        for path in sorted {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let Some((leaf, parents)) = segments.split_last() else {
                continue;
            };

            let mut level = root.children_mut();
            for (depth, segment) in parents.iter().enumerate() {
                let node = level
                    .entry(segment.to_string())
                    .or_insert_with(TreeNode::empty_directory);
                if !node.is_directory() {
                    tracing::warn!(
                        "'{}' is both a file and a directory; treating it as a directory",
                        segments[..=depth].join("/")
                    );
                }
                level = node.children_mut();
            }

            if level.get(*leaf).is_some_and(TreeNode::is_directory) {
                tracing::warn!(
                    "'{}' is both a file and a directory; keeping the directory",
                    path
                );
                continue;
            }
            level.insert(leaf.to_string(), TreeNode::File);
        }

        root
    }

    /// Renders `tree` below a `root_label/` line, depth first, with box-drawing
    /// connectors. Directories carry a trailing `/`.
    pub fn render(tree: &TreeNode, root_label: &str) -> String {
        let mut result = format!("└── {root_label}/\n");

        match tree.children() {
            Some(children) if !children.is_empty() => {
                Self::render_children(children, &mut result, "    ");
            }
            _ => {
                result.push_str("    ");
                result.push_str(EMPTY_TREE_LINE);
                result.push('\n');
            }
        }

        result
    }

    /// Builds and renders in one step.
    pub fn generate_tree<S: AsRef<str>>(paths: &[S], root_label: &str) -> String {
        Self::render(&Self::build(paths), root_label)
    }

    fn render_children(children: &BTreeMap<String, TreeNode>, result: &mut String, prefix: &str) {
        let count = children.len();

        for (i, (name, node)) in children.iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { "└── " } else { "├── " };
            let suffix = if node.is_directory() { "/" } else { "" };

            result.push_str(&format!("{prefix}{connector}{name}{suffix}\n"));

            if let Some(grandchildren) = node.children().filter(|c| !c.is_empty()) {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_children(grandchildren, result, &new_prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn nested_paths_render_alphabetically() {
        let text = TreeGenerator::generate_tree(&["e.txt", "a/c/d.txt", "a/b.txt"], "repo");
        insta::assert_snapshot!(text, @r"
        └── repo/
            ├── a/
            │   ├── b.txt
            │   └── c/
            │       └── d.txt
            └── e.txt
        ");
    }

    #[test]
    fn empty_input_renders_placeholder() {
        let paths: [&str; 0] = [];
        assert_eq!(
            TreeGenerator::generate_tree(&paths, "demo"),
            "└── demo/\n    (No processable files found)\n"
        );
    }

    #[test]
    fn directories_sort_among_files_by_name() {
        let text = TreeGenerator::generate_tree(&["zeta.rs", "beta/x.rs", "alpha.rs"], "r");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "└── r/",
                "    ├── alpha.rs",
                "    ├── beta/",
                "    │   └── x.rs",
                "    └── zeta.rs",
            ]
        );
    }

    #[test]
    fn empty_segments_are_skipped() {
        let tree = TreeGenerator::build(&["a//b.txt", "/c.txt", ""]);
        let children = tree.children().unwrap();
        assert_eq!(children.keys().collect::<Vec<_>>(), ["a", "c.txt"]);
        assert!(children["a"].children().unwrap().contains_key("b.txt"));
    }

    #[traced_test]
    #[test]
    fn file_is_promoted_when_a_later_path_needs_children() {
        let tree = TreeGenerator::build(&["docs", "docs/guide.md"]);
        let docs = &tree.children().unwrap()["docs"];
        assert!(docs.is_directory());
        assert_eq!(docs.children().unwrap()["guide.md"], TreeNode::File);
        assert!(logs_contain("treating it as a directory"));
    }

    #[traced_test]
    #[test]
    fn directory_is_kept_when_a_file_collides_with_it() {
        // The leading slash sorts "/lib/mod.rs" ahead of "lib".
        let tree = TreeGenerator::build(&["lib", "/lib/mod.rs"]);
        let lib = &tree.children().unwrap()["lib"];
        let names: Vec<_> = lib.children().unwrap().keys().cloned().collect();
        assert_eq!(names, ["mod.rs"]);
        assert!(logs_contain("keeping the directory"));
    }

    #[test]
    fn duplicate_paths_render_once() {
        let text = TreeGenerator::generate_tree(&["a.txt", "a.txt"], "r");
        assert_eq!(text, "└── r/\n    └── a.txt\n");
    }
}
