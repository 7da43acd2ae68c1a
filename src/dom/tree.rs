use crate::dom::element::ElementNode;
use crate::dom::html;
use crate::dom::selector::Selector;
use crate::error::{Result, ScriptError};

/// Position of a node as child indices from the root
pub type NodePath = Vec<usize>;

/// A whole document, addressable by [`NodePath`]
#[derive(Debug, Clone, PartialEq)]
pub struct DomTree {
    /// Root element of the document
    pub root: ElementNode,
}

impl DomTree {
    /// Create a new DomTree
    pub fn new(root: ElementNode) -> Self {
        Self { root }
    }

    /// Paths of every element matching `selector`, in document order
    pub fn find_paths(&self, selector: &str) -> Result<Vec<NodePath>> {
        Ok(html::match_paths(&self.root, &Selector::parse(selector)?))
    }

    /// Path of the first element matching `selector`
    pub fn find_path(&self, selector: &str) -> Result<Option<NodePath>> {
        Ok(self.find_paths(selector)?.into_iter().next())
    }

    /// Node at `path`
    pub fn node(&self, path: &[usize]) -> Option<&ElementNode> {
        self.root.descendant(path)
    }

    /// Mutable node at `path`
    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        path.iter().try_fold(&mut self.root, |node, &i| node.children.get_mut(i))
    }

    /// Like [`DomTree::node_mut`], but a missing node is an error naming `selector`
    pub fn expect_node_mut(&mut self, path: &[usize], selector: &str) -> Result<&mut ElementNode> {
        self.node_mut(path).ok_or_else(|| ScriptError::ElementMissing(selector.to_string()))
    }

    /// Snapshot of the first element matching `selector`
    pub fn query(&self, selector: &str) -> Result<Option<ElementNode>> {
        Ok(self.find_path(selector)?.and_then(|path| self.node(&path).cloned()))
    }

    /// Snapshots of all elements matching `selector`
    pub fn query_all(&self, selector: &str) -> Result<Vec<ElementNode>> {
        Ok(self
            .find_paths(selector)?
            .iter()
            .filter_map(|path| self.node(path).cloned())
            .collect())
    }
}

/// Whether `ancestor` is `path` itself or one of its ancestors
pub fn contains_path(ancestor: &[usize], path: &[usize]) -> bool {
    path.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tree() -> DomTree {
        let root = ElementNode::new("body")
            .with_child(
                ElementNode::new("div").with_attribute("id", "player").with_child(
                    ElementNode::new("div").with_attribute("class", "player-middle").with_child(
                        ElementNode::new("button")
                            .with_attribute("data-id", "repeat")
                            .with_attribute("value", "NO_REPEAT"),
                    ),
                ),
            )
            .with_child(
                ElementNode::new("div")
                    .with_attribute("id", "main")
                    .with_child(ElementNode::new("div").with_attribute("class", "card"))
                    .with_child(ElementNode::new("div").with_attribute("class", "card")),
            );
        DomTree::new(root)
    }

    #[test]
    fn test_find_paths_document_order() {
        let tree = create_test_tree();
        assert_eq!(tree.find_paths(".card").unwrap(), vec![vec![1, 0], vec![1, 1]]);
        assert_eq!(tree.find_path("#player > div.player-middle > button").unwrap(), Some(vec![0, 0, 0]));
        assert_eq!(tree.find_path("#nothing").unwrap(), None);
    }

    #[test]
    fn test_node_lookup_and_mutation() {
        let mut tree = create_test_tree();
        let path = tree.find_path("button[data-id='repeat']").unwrap().unwrap();
        tree.node_mut(&path).unwrap().set_attribute("value", "LIST_REPEAT");

        let button = tree.query("button[data-id='repeat']").unwrap().unwrap();
        assert_eq!(button.attr("value"), Some("LIST_REPEAT"));
        assert!(tree.node(&[5, 1]).is_none());
        assert!(tree.expect_node_mut(&[5], "#gone").is_err());
    }

    #[test]
    fn test_contains_path() {
        assert!(contains_path(&[1], &[1, 0]));
        assert!(contains_path(&[1, 0], &[1, 0]));
        assert!(!contains_path(&[1, 0], &[1]));
        assert!(!contains_path(&[0], &[1, 0]));
    }
}
