//! Arena-backed document model
//!
//! A [`Document`] holds the markup tree together with the live state a
//! browser keeps outside of attributes: form values, checkedness, frame
//! contents, media surfaces, stylesheets and shadow roots. The engine that
//! owns a page keeps this model in sync; the serializer only reads it and
//! builds a second `Document` as the clone it emits.

#[cfg(feature = "parser")]
pub mod parse;
pub mod stylesheet;

use std::collections::HashMap;
use std::sync::Arc;

use crate::platform::{Capabilities, Surface};
pub use stylesheet::StyleSheet;

/// Index of a node inside its owning [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Encapsulation mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

impl ShadowRootMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Doctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

impl Doctype {
    pub fn html5() -> Self {
        Self {
            name: "html".to_string(),
            ..Default::default()
        }
    }
}

/// Live state of an embedded frame.
#[derive(Debug, Default)]
pub struct FrameState {
    /// The frame's document, or `None` when it is not accessible (cross-origin)
    pub content: Option<Box<Document>>,
    /// Whether the frame has fired its load event
    pub loaded: bool,
}

impl FrameState {
    pub fn loaded(content: Document) -> Self {
        Self {
            content: Some(Box::new(content)),
            loaded: true,
        }
    }

    pub fn loading(content: Document) -> Self {
        Self {
            content: Some(Box::new(content)),
            loaded: false,
        }
    }

    pub fn inaccessible() -> Self {
        Self::default()
    }
}

/// Element state that is not reflected in attributes.
#[derive(Debug, Default)]
pub struct LiveState {
    value: Option<String>,
    checked: Option<bool>,
    selected: Option<bool>,
    frame: Option<FrameState>,
    surface: Option<Arc<dyn Surface>>,
    sheet: Option<Arc<StyleSheet>>,
}

#[derive(Debug)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    shadow_root: Option<NodeId>,
    state: LiveState,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            shadow_root: None,
            state: LiveState::default(),
        }
    }

    /// Lowercase local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attributes in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }

    /// A copy with the same name and attributes but none of the live state.
    pub fn shallow_copy(&self) -> Element {
        Element {
            name: self.name.clone(),
            attrs: self.attrs.clone(),
            shadow_root: None,
            state: LiveState::default(),
        }
    }
}

#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype(Doctype),
    Element(Element),
    Text(String),
    Comment(String),
    ShadowRoot { host: NodeId, mode: ShadowRootMode },
}

#[derive(Debug)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl Node {
    pub fn data(&self) -> &NodeData {
        &self.data
    }
}

/// Form control kinds, as reported by a control's `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlType {
    Checkbox,
    Radio,
    SelectOne,
    SelectMultiple,
    TextArea,
    /// Any other `<input>` type, lowercased (`text` when unspecified)
    Input(String),
}

const ROOT: NodeId = NodeId(0);

/// A document tree plus its live state.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    url: String,
    adopted: HashMap<NodeId, Vec<Arc<StyleSheet>>>,
    /// What the runtime hosting this document supports
    pub capabilities: Capabilities,
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl Document {
    /// An empty document at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            url: url.into(),
            adopted: HashMap::new(),
            capabilities: Capabilities::default(),
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    // --- construction ---

    fn create_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_node(NodeData::Element(Element::new(name)))
    }

    pub(crate) fn adopt_element(&mut self, element: Element) -> NodeId {
        self.create_node(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeData::Comment(text.into()))
    }

    /// Set the document type declaration, replacing any existing one.
    pub fn set_doctype(&mut self, doctype: Doctype) -> NodeId {
        if let Some(existing) = self.doctype_node() {
            self.remove(existing);
        }
        let id = self.create_node(NodeData::Doctype(doctype));
        self.prepend(ROOT, id);
        id
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(name);
        if let Some(el) = self.element_mut(id) {
            for (k, v) in attrs {
                el.set_attr(k, *v);
            }
        }
        self.append_child(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    // --- tree mutation ---

    /// Detach `node` from its parent. The node stays in the arena.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.remove(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before `reference` in `parent`, or append when the
    /// reference is `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.remove(child);
        self.nodes[child.0].parent = Some(parent);
        let pos = reference.and_then(|r| self.nodes[parent.0].children.iter().position(|c| *c == r));
        match pos {
            Some(pos) => self.nodes[parent.0].children.insert(pos, child),
            None => self.nodes[parent.0].children.push(child),
        }
    }

    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        let first = self.first_child(parent);
        self.insert_before(parent, child, first);
    }

    pub fn clear_children(&mut self, node: NodeId) {
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Attach a shadow root to `host`, or clear and return the existing one.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Option<NodeId> {
        let existing = self.element(host)?.shadow_root;
        if let Some(root) = existing {
            self.clear_children(root);
            return Some(root);
        }
        let root = self.create_node(NodeData::ShadowRoot { host, mode });
        self.element_mut(host)?.shadow_root = Some(root);
        Some(root)
    }

    // --- navigation ---

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|c| *c == node)?;
        siblings.get(pos + 1).copied()
    }

    /// Whether `node` is `ancestor` or one of its light-tree descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Light-tree descendants of `scope` in tree order, excluding `scope`.
    /// Shadow trees are not entered.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `scope` with the given local name.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.tag_name(*id) == Some(tag))
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(ROOT)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    pub fn doctype(&self) -> Option<&Doctype> {
        self.doctype_node().and_then(|id| match &self.nodes[id.0].data {
            NodeData::Doctype(d) => Some(d),
            _ => None,
        })
    }

    fn doctype_node(&self) -> Option<NodeId> {
        self.children(ROOT)
            .iter()
            .copied()
            .find(|id| matches!(self.nodes[id.0].data, NodeData::Doctype(_)))
    }

    /// The first element child of the document node.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(ROOT)
            .iter()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "body")
    }

    fn child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.tag_name(*id) == Some(tag))
    }

    /// The URL relative references resolve against: the first `<base href>`
    /// in the document, or the document URL.
    pub fn base_uri(&self) -> String {
        let base = self
            .elements_by_tag(ROOT, "base")
            .into_iter()
            .find_map(|id| self.attr(id, "href").map(str::to_string));
        match base {
            Some(href) => url::Url::parse(&self.url)
                .and_then(|u| u.join(&href))
                .map(|u| u.to_string())
                .unwrap_or(href),
            None => self.url.clone(),
        }
    }

    // --- element access ---

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::name)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node)?.remove_attr(name)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host)?.shadow_root
    }

    pub fn shadow_root_mode(&self, root: NodeId) -> Option<ShadowRootMode> {
        match self.nodes[root.0].data {
            NodeData::ShadowRoot { mode, .. } => Some(mode),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => t.clone(),
            _ => self
                .descendants(node)
                .into_iter()
                .filter_map(|id| match &self.nodes[id.0].data {
                    NodeData::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        if let NodeData::Text(t) = &mut self.nodes[node.0].data {
            *t = text.to_string();
            return;
        }
        self.clear_children(node);
        if !text.is_empty() {
            self.append_text(node, text);
        }
    }

    // --- live form state ---

    pub fn control_type(&self, node: NodeId) -> Option<ControlType> {
        let el = self.element(node)?;
        match el.name() {
            "textarea" => Some(ControlType::TextArea),
            "select" if el.has_attr("multiple") => Some(ControlType::SelectMultiple),
            "select" => Some(ControlType::SelectOne),
            "input" => {
                let ty = el.attr("type").unwrap_or("text").trim().to_ascii_lowercase();
                Some(match ty.as_str() {
                    "checkbox" => ControlType::Checkbox,
                    "radio" => ControlType::Radio,
                    "" => ControlType::Input("text".to_string()),
                    _ => ControlType::Input(ty),
                })
            }
            _ => None,
        }
    }

    /// Current value of an input or textarea.
    pub fn value(&self, node: NodeId) -> String {
        let Some(el) = self.element(node) else {
            return String::new();
        };
        if let Some(v) = &el.state.value {
            return v.clone();
        }
        match el.name() {
            "textarea" => self.text_content(node),
            _ => el.attr("value").unwrap_or_default().to_string(),
        }
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.state.value = Some(value.into());
        }
    }

    /// Current checkedness; defaults to the presence of `checked`.
    pub fn checked(&self, node: NodeId) -> bool {
        self.element(node)
            .map(|el| el.state.checked.unwrap_or_else(|| el.has_attr("checked")))
            .unwrap_or(false)
    }

    /// Set checkedness. Checking a radio button unchecks the other radios
    /// with the same name in its tree.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        if checked && self.control_type(node) == Some(ControlType::Radio) {
            if let Some(name) = self.attr(node, "name").map(str::to_string) {
                let scope = self.tree_root(node);
                let group: Vec<NodeId> = self
                    .elements_by_tag(scope, "input")
                    .into_iter()
                    .filter(|id| *id != node)
                    .filter(|id| self.control_type(*id) == Some(ControlType::Radio))
                    .filter(|id| self.attr(*id, "name") == Some(name.as_str()))
                    .collect();
                for other in group {
                    if let Some(el) = self.element_mut(other) {
                        el.state.checked = Some(false);
                    }
                }
            }
        }
        if let Some(el) = self.element_mut(node) {
            el.state.checked = Some(checked);
        }
    }

    fn tree_root(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// The `<option>` elements of a select, in tree order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.elements_by_tag(select, "option")
    }

    /// Current selectedness of an option; defaults to the presence of `selected`.
    pub fn selected(&self, option: NodeId) -> bool {
        self.element(option)
            .map(|el| el.state.selected.unwrap_or_else(|| el.has_attr("selected")))
            .unwrap_or(false)
    }

    /// Set selectedness. Selecting an option of a single select deselects
    /// its siblings.
    pub fn set_selected(&mut self, option: NodeId, selected: bool) {
        if selected {
            let select = self.ancestor_select(option);
            if let Some(select) = select.filter(|s| self.control_type(*s) == Some(ControlType::SelectOne)) {
                for other in self.options(select) {
                    if let Some(el) = self.element_mut(other) {
                        el.state.selected = Some(false);
                    }
                }
            }
        }
        if let Some(el) = self.element_mut(option) {
            el.state.selected = Some(selected);
        }
    }

    fn ancestor_select(&self, node: NodeId) -> Option<NodeId> {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if self.tag_name(current) == Some("select") {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Index of the selected option. A single select with nothing explicitly
    /// selected displays its first enabled option.
    pub fn selected_index(&self, select: NodeId) -> Option<usize> {
        let options = self.options(select);
        if let Some(i) = options.iter().position(|o| self.selected(*o)) {
            return Some(i);
        }
        if self.control_type(select) == Some(ControlType::SelectOne) {
            return options.iter().position(|o| !self.has_attr(*o, "disabled"));
        }
        None
    }

    /// Indices of every selected option.
    pub fn selected_indices(&self, select: NodeId) -> Vec<usize> {
        self.options(select)
            .iter()
            .enumerate()
            .filter(|(_, o)| self.selected(**o))
            .map(|(i, _)| i)
            .collect()
    }

    fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    // --- frames, media and stylesheets ---

    pub fn frame(&self, node: NodeId) -> Option<&FrameState> {
        self.element(node)?.state.frame.as_ref()
    }

    pub fn set_frame(&mut self, node: NodeId, frame: FrameState) {
        if let Some(el) = self.element_mut(node) {
            el.state.frame = Some(frame);
        }
    }

    /// The surface backing a canvas or the current frame of a video.
    pub fn surface(&self, node: NodeId) -> Option<&Arc<dyn Surface>> {
        self.element(node)?.state.surface.as_ref()
    }

    pub fn set_surface(&mut self, node: NodeId, surface: Arc<dyn Surface>) {
        if let Some(el) = self.element_mut(node) {
            el.state.surface = Some(surface);
        }
    }

    pub fn style_sheet(&self, node: NodeId) -> Option<&Arc<StyleSheet>> {
        self.element(node)?.state.sheet.as_ref()
    }

    pub fn set_style_sheet(&mut self, node: NodeId, sheet: Arc<StyleSheet>) {
        if let Some(el) = self.element_mut(node) {
            el.state.sheet = Some(sheet);
        }
    }

    /// Stylesheets owned by elements in `scope`, in tree order.
    pub fn style_sheets(&self, scope: NodeId) -> Vec<(NodeId, Arc<StyleSheet>)> {
        self.descendants(scope)
            .into_iter()
            .filter_map(|id| self.style_sheet(id).map(|s| (id, Arc::clone(s))))
            .collect()
    }

    /// Adopted stylesheets of the document node or a shadow root.
    pub fn adopted_style_sheets(&self, scope: NodeId) -> &[Arc<StyleSheet>] {
        self.adopted.get(&scope).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_adopted_style_sheets(&mut self, scope: NodeId, sheets: Vec<Arc<StyleSheet>>) {
        self.adopted.insert(scope, sheets);
    }

    /// Create a parsed stylesheet for every `<style>` element lacking one.
    pub fn init_style_sheets(&mut self) {
        let styles: Vec<NodeId> = self
            .descendants(ROOT)
            .into_iter()
            .filter(|id| self.tag_name(*id) == Some("style") && self.style_sheet(*id).is_none())
            .collect();
        for id in styles {
            let sheet = StyleSheet::parse(&self.text_content(id));
            self.set_style_sheet(id, Arc::new(sheet));
        }
    }
}
