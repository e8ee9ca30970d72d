//! Per-element built-in grammars, cached by `(URI_id, LocalName_id)`
//! (spec.md §4.5). Grounded on the teacher's per-`TableKind` dispatch
//! in `tables.rs`/`rows.rs` - a closed, tag-indexed set of row decoders
//! - generalized here to a *dynamic*, per-element set of learned
//! productions, since built-in grammars grow at runtime while the
//! teacher's metadata tables are schema-fixed.

use std::collections::HashMap;

use super::production::{EventKind, GrammarState, Production};
use crate::strings::CompactId;

/// One element's grammar: the start-tag-content production list and
/// the element-content production list it falls through to once the
/// start tag has settled.
#[derive(Debug, Clone)]
pub struct ElementGrammar {
    start_tag: Vec<Production>,
    element_content: Vec<Production>,
}

impl ElementGrammar {
    /// The built-in schema-less grammar every freshly-seen element
    /// starts with: any attribute, any namespace declaration, any
    /// child element, characters, or an immediate end tag.
    pub fn new_builtin() -> Self {
        Self {
            start_tag: vec![
                Production::wildcard(EventKind::Attribute, GrammarState::StartTagContent),
                Production::wildcard(EventKind::NamespaceDeclaration, GrammarState::StartTagContent),
                Production::wildcard(EventKind::StartElement, GrammarState::ElementContent),
                Production::wildcard(EventKind::Characters, GrammarState::ElementContent),
                Production::wildcard(EventKind::EndElement, GrammarState::ElementContent),
            ],
            element_content: vec![
                Production::wildcard(EventKind::StartElement, GrammarState::ElementContent),
                Production::wildcard(EventKind::Characters, GrammarState::ElementContent),
                Production::wildcard(EventKind::EndElement, GrammarState::ElementContent),
            ],
        }
    }

    fn productions(&self, state: GrammarState) -> &[Production] {
        match state {
            GrammarState::StartTagContent => &self.start_tag,
            GrammarState::ElementContent => &self.element_content,
        }
    }

    fn productions_mut(&mut self, state: GrammarState) -> &mut Vec<Production> {
        match state {
            GrammarState::StartTagContent => &mut self.start_tag,
            GrammarState::ElementContent => &mut self.element_content,
        }
    }

    /// Compact-ID width needed to reference a production in `state`
    /// right now.
    pub fn log(&self, state: GrammarState) -> u32 {
        super::production::code_width(self.productions(state).len() as u32)
    }

    /// Finds the production index matching `event`/`qname`: an
    /// exact-qname match takes priority over the wildcard, since a
    /// prior `learn` call may have added one.
    pub fn find(&self, state: GrammarState, event: EventKind, qname: Option<(CompactId, CompactId)>) -> Option<u32> {
        let list = self.productions(state);
        if qname.is_some() {
            if let Some(i) = list.iter().position(|p| p.event == event && p.qname == qname) {
                return Some(i as u32);
            }
        }
        list.iter().position(|p| p.matches(event, qname)).map(|i| i as u32)
    }

    pub fn get(&self, state: GrammarState, id: u32) -> Option<Production> {
        self.productions(state).get(id as usize).copied()
    }

    /// Records that `event`/`qname` occurred through the wildcard
    /// production in `state`, appending a specific production so a
    /// future occurrence of the same `(event, qname)` pair is
    /// distinguishable from the still-present generic wildcard
    /// (built-in grammar "learning", spec.md §4.5).
    pub fn learn(&mut self, state: GrammarState, event: EventKind, qname: (CompactId, CompactId), next: GrammarState) {
        let list = self.productions_mut(state);
        if list.iter().any(|p| p.event == event && p.qname == Some(qname)) {
            return;
        }
        list.push(Production::specific(event, qname, next));
    }
}

/// Caches one `ElementGrammar` per `(URI_id, LocalName_id)` for the
/// lifetime of a single decode/encode session.
#[derive(Default)]
pub struct GrammarCache {
    elements: HashMap<(u32, u32), ElementGrammar>,
}

impl GrammarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the grammar for `key`, creating a fresh built-in one on
    /// first use.
    pub fn get_or_create(&mut self, key: (CompactId, CompactId)) -> &mut ElementGrammar {
        self.elements.entry((key.0 .0, key.1 .0)).or_insert_with(ElementGrammar::new_builtin)
    }
}
