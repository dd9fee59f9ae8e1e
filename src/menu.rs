//! Static menu tree and the navigation cursor that walks it. The tree is an
//! index arena built once at startup (the Docker branch from one container
//! listing) and never mutated; navigation state is a node id, a selected
//! child index, and an explicit back-stack. No parent pointers anywhere.

use crate::action::ActionRequest;
use crate::docker::ContainerSummary;

pub type NodeId = usize;

/// What a menu entry does when confirmed.
#[derive(Debug, Clone)]
pub enum Entry {
    /// Inner node; confirming descends into its children.
    Submenu(Vec<NodeId>),
    /// Leaf; confirming submits the request to the action executor.
    Action(ActionRequest),
    /// Leaf; confirming starts a fresh Snake game.
    Game,
    /// Leaf; confirming shuts the application down gracefully.
    Quit,
}

#[derive(Debug, Clone)]
pub struct MenuNode {
    pub label: String,
    pub entry: Entry,
}

/// Array-backed menu tree. Node 0 is the root submenu.
pub struct MenuTree {
    nodes: Vec<MenuNode>,
}

impl MenuTree {
    pub const ROOT: NodeId = 0;

    /// Build the full device menu. `containers` is the listing taken at
    /// startup; each container gets its own lifecycle submenu.
    pub fn build(containers: &[ContainerSummary]) -> Self {
        let mut builder = TreeBuilder::new();
        let root = builder.submenu("Main");

        let docker = builder.submenu("Docker");
        let list = builder.leaf("List Containers", Entry::Action(ActionRequest::ContainerList));
        builder.attach(docker, list);
        for container in containers {
            let sub = builder.submenu(&format!("{} [{}]", container.name, container.status));
            for (label, request) in [
                ("Start", ActionRequest::ContainerStart { id: container.id.clone() }),
                ("Stop", ActionRequest::ContainerStop { id: container.id.clone() }),
                ("Restart", ActionRequest::ContainerRestart { id: container.id.clone() }),
            ] {
                let leaf = builder.leaf(label, Entry::Action(request));
                builder.attach(sub, leaf);
            }
            builder.attach(docker, sub);
        }
        builder.attach(root, docker);

        for (label, request) in [
            ("System Info", ActionRequest::SystemInfo),
            ("Check IP", ActionRequest::ShowIp),
            ("CPU Temp", ActionRequest::CpuTemp),
            ("Disk Usage", ActionRequest::Disk),
            ("Memory Info", ActionRequest::Mem),
            ("Update System", ActionRequest::Update),
        ] {
            let leaf = builder.leaf(label, Entry::Action(request));
            builder.attach(root, leaf);
        }

        let games = builder.submenu("Games");
        let snake = builder.leaf("Snake", Entry::Game);
        builder.attach(games, snake);
        builder.attach(root, games);

        for (label, request) in [
            ("Restart Pi", ActionRequest::Restart),
            ("Shutdown", ActionRequest::Shutdown),
        ] {
            let leaf = builder.leaf(label, Entry::Action(request));
            builder.attach(root, leaf);
        }
        let exit = builder.leaf("Exit", Entry::Quit);
        builder.attach(root, exit);

        debug_assert_eq!(root, Self::ROOT);
        Self { nodes: builder.nodes }
    }

    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id]
    }

    /// Children of an inner node. Leaves have no children.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id].entry {
            Entry::Submenu(children) => children,
            _ => &[],
        }
    }
}

struct TreeBuilder {
    nodes: Vec<MenuNode>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn submenu(&mut self, label: &str) -> NodeId {
        self.push(label, Entry::Submenu(Vec::new()))
    }

    fn leaf(&mut self, label: &str, entry: Entry) -> NodeId {
        self.push(label, entry)
    }

    fn push(&mut self, label: &str, entry: Entry) -> NodeId {
        self.nodes.push(MenuNode {
            label: label.to_string(),
            entry,
        });
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.nodes[parent].entry {
            Entry::Submenu(children) => children.push(child),
            _ => unreachable!("attach target must be a submenu"),
        }
    }
}

/// Result of confirming the selected entry.
#[derive(Debug)]
pub enum Confirmed {
    Descended,
    Submit(ActionRequest),
    StartGame,
    Quit,
}

/// Cursor into the static tree: the submenu being shown, which child is
/// selected, and the trail of `(node, selection)` pairs for "back".
pub struct NavigationState {
    node: NodeId,
    selected: usize,
    trail: Vec<(NodeId, usize)>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            node: MenuTree::ROOT,
            selected: 0,
            trail: Vec::new(),
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn at_root(&self) -> bool {
        self.trail.is_empty()
    }

    /// Title of the submenu currently shown.
    pub fn title<'t>(&self, tree: &'t MenuTree) -> &'t str {
        &tree.node(self.node).label
    }

    /// Labels of the current submenu's children, in display order.
    pub fn labels<'t>(&self, tree: &'t MenuTree) -> Vec<&'t str> {
        tree.children(self.node)
            .iter()
            .map(|&id| tree.node(id).label.as_str())
            .collect()
    }

    /// Move the selection one sibling over, wrapping at both ends. Cyclic on
    /// purpose: the fastest way around a short menu is often backwards.
    pub fn rotate(&mut self, tree: &MenuTree, clockwise: bool) {
        let len = tree.children(self.node).len();
        if len == 0 {
            return;
        }
        self.selected = if clockwise {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    /// Act on the selected child.
    pub fn confirm(&mut self, tree: &MenuTree) -> Confirmed {
        let child = tree.children(self.node)[self.selected];
        match &tree.node(child).entry {
            Entry::Submenu(_) => {
                self.trail.push((self.node, self.selected));
                self.node = child;
                self.selected = 0;
                Confirmed::Descended
            }
            Entry::Action(request) => Confirmed::Submit(request.clone()),
            Entry::Game => Confirmed::StartGame,
            Entry::Quit => Confirmed::Quit,
        }
    }

    /// Ascend one level, restoring the prior selection. No-op at the root.
    pub fn back(&mut self) -> bool {
        match self.trail.pop() {
            Some((node, selected)) => {
                self.node = node;
                self.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Unwind the whole trail back to the root menu.
    pub fn to_root(&mut self) {
        if let Some(&(root, selected)) = self.trail.first() {
            self.node = root;
            self.selected = selected;
            self.trail.clear();
        }
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> MenuTree {
        MenuTree::build(&[ContainerSummary {
            id: "abc123".into(),
            name: "web".into(),
            status: "running".into(),
            image: "nginx".into(),
        }])
    }

    #[test]
    fn root_labels_cover_the_device_menu() {
        let tree = tree();
        let nav = NavigationState::new();
        let labels = nav.labels(&tree);
        assert_eq!(labels.first(), Some(&"Docker"));
        assert_eq!(labels.last(), Some(&"Exit"));
        assert!(labels.contains(&"Games"));
    }

    #[test]
    fn rotation_wraps_both_ways() {
        let tree = tree();
        let mut nav = NavigationState::new();
        let len = nav.labels(&tree).len();
        nav.rotate(&tree, false);
        assert_eq!(nav.selected_index(), len - 1, "CCW from first wraps to last");
        nav.rotate(&tree, true);
        assert_eq!(nav.selected_index(), 0, "CW from last wraps to first");
    }

    #[test]
    fn back_at_root_is_a_noop() {
        let tree = tree();
        let mut nav = NavigationState::new();
        nav.rotate(&tree, true);
        let before = nav.selected_index();
        assert!(!nav.back());
        assert_eq!(nav.selected_index(), before);
        assert!(nav.at_root());
    }

    #[test]
    fn descend_and_back_restore_selection() {
        let tree = tree();
        let mut nav = NavigationState::new();
        // Docker is the first root entry.
        assert!(matches!(nav.confirm(&tree), Confirmed::Descended));
        assert_eq!(nav.title(&tree), "Docker");
        assert_eq!(nav.selected_index(), 0);
        assert!(nav.back());
        assert_eq!(nav.selected_index(), 0);
        assert!(nav.at_root());
    }

    #[test]
    fn container_submenu_carries_the_id() {
        let tree = tree();
        let mut nav = NavigationState::new();
        nav.confirm(&tree); // Docker
        nav.rotate(&tree, true); // past "List Containers" to "web [running]"
        assert!(matches!(nav.confirm(&tree), Confirmed::Descended));
        match nav.confirm(&tree) {
            Confirmed::Submit(ActionRequest::ContainerStart { id }) => {
                assert_eq!(id, "abc123");
            }
            other => panic!("expected container start, got {other:?}"),
        }
    }

    #[test]
    fn to_root_unwinds_nested_trail() {
        let tree = tree();
        let mut nav = NavigationState::new();
        nav.confirm(&tree); // Docker
        nav.rotate(&tree, true);
        nav.confirm(&tree); // container submenu
        assert!(!nav.at_root());
        nav.to_root();
        assert!(nav.at_root());
        assert_eq!(nav.title(&tree), "Main");
        assert_eq!(nav.selected_index(), 0);
    }

    #[test]
    fn game_and_quit_leaves_resolve() {
        let tree = tree();
        let mut nav = NavigationState::new();
        let labels = nav.labels(&tree);
        let games = labels.iter().position(|l| *l == "Games").unwrap();
        for _ in 0..games {
            nav.rotate(&tree, true);
        }
        nav.confirm(&tree);
        assert!(matches!(nav.confirm(&tree), Confirmed::StartGame));
        nav.back();
        let labels = nav.labels(&tree);
        let exit = labels.iter().position(|l| *l == "Exit").unwrap();
        while nav.selected_index() != exit {
            nav.rotate(&tree, true);
        }
        assert!(matches!(nav.confirm(&tree), Confirmed::Quit));
    }
}
