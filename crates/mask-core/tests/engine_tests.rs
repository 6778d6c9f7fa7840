/// Tree passes: traversal, rewriting, no-op and idempotence guarantees.
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use mask_core::{
    Context, Element, EngineState, FilterRegistry, HostNode, MaskError, Node, TemplateEngine,
};
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

fn engine() -> TemplateEngine {
    let ctx = Context::try_from(json!({
        "user": {"name": "_mask|1|2|3|4|Bob", "phone": "_mask|GM|bm9uY2U|ZW5j|bWFj|138****5678"},
        "greeting": "Hi",
        "site": {"url": "https://example.com"}
    }))
    .unwrap();
    TemplateEngine::new(ctx)
}

/// A host tree that records every write, to observe that untouched nodes are
/// never written.
#[derive(Debug, Default)]
struct Recording {
    text: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Recording>,
    writes: usize,
}

impl Recording {
    fn leaf(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn element(attributes: &[(&str, &str)], children: Vec<Recording>) -> Self {
        Self {
            attributes: attributes
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            children,
            ..Self::default()
        }
    }

    fn total_writes(&self) -> usize {
        self.writes + self.children.iter().map(Recording::total_writes).sum::<usize>()
    }
}

impl HostNode for Recording {
    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn set_text(&mut self, text: String) {
        self.writes += 1;
        self.text = Some(text);
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|(n, _)| n.clone()).collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, name: &str, value: String) {
        self.writes += 1;
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        }
    }

    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }
}

// ============================================================================
// 1. Reference scenarios
// ============================================================================

#[test]
fn text_node_scenario() {
    let mut tree: Node = Element::new("p")
        .with_text("Hello {{user.name | mask}}!")
        .into();
    engine().scan_now(&mut tree);
    assert_eq!(tree.text_content(), "Hello Bob!");
}

#[test]
fn attribute_scenario() {
    let mut tree: Node = Element::new("span")
        .with_attribute("title", "{{greeting}}")
        .into();
    engine().scan_now(&mut tree);
    assert_eq!(tree.as_element().unwrap().get("title"), Some("Hi"));
}

// ============================================================================
// 2. Rewriting
// ============================================================================

#[test]
fn multiple_placeholders_in_one_text() {
    let mut tree: Node = "{{greeting}}, {{ user.name | mask }}. Call {{user.phone|mask}}".into();
    engine().scan_now(&mut tree);
    assert_eq!(tree.text_content(), "Hi, Bob. Call 138****5678");
}

#[test]
fn every_attribute_is_scanned_independently() {
    let mut tree: Node = Element::new("a")
        .with_attribute("href", "{{site.url}}/u/{{user.name|mask}}")
        .with_attribute("title", "{{greeting}}")
        .with_attribute("class", "link")
        .into();
    let report = engine().scan_now(&mut tree);

    let a = tree.as_element().unwrap();
    assert_eq!(a.get("href"), Some("https://example.com/u/Bob"));
    assert_eq!(a.get("title"), Some("Hi"));
    assert_eq!(a.get("class"), Some("link"));
    assert_eq!(report.attribute_rewrites, 2);
    assert_eq!(report.placeholders, 3);
}

#[test]
fn nested_elements_are_rewritten() {
    let mut tree: Node = Element::new("div")
        .with_child(
            Element::new("ul")
                .with_child(Element::new("li").with_text("{{user.name|mask}}"))
                .with_child(Element::new("li").with_text("{{user.phone|mask}}")),
        )
        .with_child(Element::new("footer").with_attribute("data-greeting", "{{greeting}}"))
        .into();
    let report = engine().scan_now(&mut tree);

    assert_eq!(tree.text_content(), "Bob138****5678");
    assert_eq!(report.text_rewrites, 2);
    assert_eq!(report.attribute_rewrites, 1);
}

#[test]
fn missing_values_render_empty() {
    let mut tree: Node = Element::new("p")
        .with_text("[{{ nothing.here }}]")
        .with_attribute("title", "{{absent|mask}}")
        .into();
    let report = engine().scan_now(&mut tree);
    assert_eq!(tree.text_content(), "[]");
    assert_eq!(tree.as_element().unwrap().get("title"), Some(""));
    assert_eq!(report.faults, 0);
}

#[test]
fn marker_without_placeholder_is_left_alone() {
    let mut tree: Node = Element::new("p")
        .with_text("{{}} and {{ open")
        .into();
    let report = engine().scan_now(&mut tree);
    assert_eq!(tree.text_content(), "{{}} and {{ open");
    assert_eq!(report.rewrites(), 0);
}

#[test]
fn nested_braces_replace_innermost_only() {
    let mut tree: Node = "{{a{{greeting}}}}".into();
    engine().scan_now(&mut tree);
    assert_eq!(tree.text_content(), "{{aHi}}");
}

// ============================================================================
// 3. Traversal
// ============================================================================

#[test]
fn every_node_visited_once() {
    let mut tree: Node = Element::new("root")
        .with_text("a")
        .with_child(Element::new("x").with_text("b").with_child(Element::new("y")))
        .with_child(Element::new("z"))
        .into();
    // root, "a", x, "b", y, z
    let report = engine().scan_now(&mut tree);
    assert_eq!(report.nodes_visited, 6);
}

#[test]
fn untouched_nodes_are_never_written() {
    let mut tree = Recording::element(
        &[("class", "plain"), ("title", "{{greeting}}")],
        vec![
            Recording::leaf("no markers here"),
            Recording::leaf("{{ not closed"),
            Recording::element(&[("id", "x")], vec![Recording::leaf("{{greeting}}!")]),
        ],
    );
    let report = engine().scan_now(&mut tree);

    assert_eq!(report.nodes_visited, 5);
    assert_eq!(tree.writes, 1, "only the title attribute is written");
    assert_eq!(tree.children[0].writes, 0);
    assert_eq!(tree.children[1].writes, 0);
    assert_eq!(tree.children[2].writes, 0);
    assert_eq!(tree.children[2].children[0].writes, 1);
    assert_eq!(tree.children[2].children[0].text.as_deref(), Some("Hi!"));
    assert_eq!(tree.total_writes(), 2);
}

#[test]
fn second_pass_is_a_no_op() {
    let mut tree = Recording::element(
        &[("title", "{{greeting}}")],
        vec![Recording::leaf("Hello {{user.name | mask}}!")],
    );
    let e = engine();
    e.scan_now(&mut tree);
    let writes_after_first = tree.total_writes();

    let report = e.scan_now(&mut tree);
    assert_eq!(report.rewrites(), 0);
    assert_eq!(tree.total_writes(), writes_after_first);
    assert_eq!(tree.children[0].text.as_deref(), Some("Hello Bob!"));
}

#[test]
fn scan_is_idempotent_on_in_memory_tree() {
    let mut tree: Node = Element::new("p")
        .with_attribute("title", "{{greeting}}")
        .with_text("{{user.name | mask}}")
        .into();
    let e = engine();
    e.scan_now(&mut tree);
    let after_first = tree.clone();
    e.scan_now(&mut tree);
    assert_eq!(tree, after_first);
}

// ============================================================================
// 4. Faults stay local
// ============================================================================

#[test]
fn faulting_placeholder_does_not_affect_siblings() {
    let mut e = engine();
    e.register_fallible_filter("boom", |_| Err(MaskError::InvalidEmail));

    let mut tree: Node = Element::new("div")
        .with_child(Element::new("p").with_text("a={{greeting | boom}}, b={{greeting}}"))
        .with_child(Element::new("p").with_text("{{user.name | mask}}"))
        .into();
    let report = e.scan_now(&mut tree);

    assert_eq!(tree.text_content(), "a=, b=HiBob");
    assert_eq!(report.faults, 1);
    assert_eq!(report.placeholders, 3);
}

// ============================================================================
// 5. Triggers and state
// ============================================================================

#[test]
fn ready_signal_runs_once() {
    let e = engine();
    let mut tree: Node = "{{greeting}}".into();
    assert!(!e.ready_fired());

    let first = e.on_ready(&mut tree);
    assert_eq!(first.map(|r| r.text_rewrites), Some(1));
    assert!(e.ready_fired());

    let mut later: Node = "{{greeting}}".into();
    assert!(e.on_ready(&mut later).is_none());
    assert_eq!(later.text_content(), "{{greeting}}");

    e.scan_now(&mut later);
    assert_eq!(later.text_content(), "Hi");
}

#[test]
fn manual_rescan_after_mutation() {
    let mut e = engine();
    let mut tree: Node = Element::new("p").with_text("{{greeting}}").into();
    e.scan_now(&mut tree);

    if let Node::Element(p) = &mut tree {
        p.children.push("{{later}}".into());
    }
    e.context_mut().insert("later", "added");
    e.scan_now(&mut tree);
    assert_eq!(tree.text_content(), "Hiadded");
}

#[test]
fn engine_is_idle_outside_a_pass() {
    let e = engine();
    assert_eq!(e.state(), EngineState::Idle);
    let mut tree: Node = "{{greeting}}".into();
    e.scan_now(&mut tree);
    assert_eq!(e.state(), EngineState::Idle);
}

/// A single text node whose first read signals `entered` and then blocks
/// until `release` fires, holding its pass open.
struct Gate {
    text: String,
    entered: Sender<()>,
    release: Receiver<()>,
    held: Cell<bool>,
    children: Vec<Gate>,
}

impl HostNode for Gate {
    fn text(&self) -> Option<&str> {
        if !self.held.replace(true) {
            self.entered.send(()).unwrap();
            self.release.recv().unwrap();
        }
        Some(&self.text)
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    fn attribute_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn attribute(&self, _name: &str) -> Option<&str> {
        None
    }

    fn set_attribute(&mut self, _name: &str, _value: String) {}

    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }
}

#[test]
fn state_stays_scanning_while_any_pass_runs() {
    let e = engine();
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let mut held = Gate {
        text: "{{greeting}}".to_string(),
        entered: entered_tx,
        release: release_rx,
        held: Cell::new(false),
        children: Vec::new(),
    };

    thread::scope(|s| {
        let slow = s.spawn(|| e.scan_now(&mut held));
        entered_rx.recv().unwrap();
        assert_eq!(e.state(), EngineState::Scanning);

        // A second pass starts and finishes while the first is still open.
        let mut quick: Node = "{{user.name}}".into();
        let report = e.scan_now(&mut quick);
        assert_eq!(report.text_rewrites, 1);
        assert_eq!(e.state(), EngineState::Scanning);

        release_tx.send(()).unwrap();
        let report = slow.join().unwrap();
        assert_eq!(report.text_rewrites, 1);
    });

    assert_eq!(held.text, "Hi");
    assert_eq!(e.state(), EngineState::Idle);
}

/// A host whose text read panics.
struct Exploding(Vec<Exploding>);

impl HostNode for Exploding {
    fn text(&self) -> Option<&str> {
        panic!("host node failed")
    }

    fn set_text(&mut self, _text: String) {}

    fn attribute_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn attribute(&self, _name: &str) -> Option<&str> {
        None
    }

    fn set_attribute(&mut self, _name: &str, _value: String) {}

    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.0
    }
}

#[test]
fn state_returns_to_idle_after_panicking_host() {
    let e = engine();
    let mut tree = Exploding(Vec::new());
    let outcome = catch_unwind(AssertUnwindSafe(|| e.scan_now(&mut tree)));
    assert!(outcome.is_err());
    assert_eq!(e.state(), EngineState::Idle);
}

#[test]
fn render_helpers() {
    let e = engine();
    assert_eq!(e.render("{{greeting}} there"), "Hi there");
    assert_eq!(e.render("nothing"), "nothing");
    assert_eq!(e.render_str("nothing"), None);
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TemplateEngine>();
    assert_send_sync::<FilterRegistry>();
}
