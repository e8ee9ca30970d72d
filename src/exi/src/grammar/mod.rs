//! The built-in (schema-less) grammar engine driving the body codec
//! (spec.md §4.5): a document-level grammar plus one per-element
//! grammar, cached by `(URI_id, LocalName_id)` and pushed/popped on a
//! stack that mirrors XML nesting.

mod element;
mod production;

pub use element::{ElementGrammar, GrammarCache};
pub use production::{code_width, EventKind, GrammarState, Production};

use crate::strings::CompactId;

/// The two states of the top-level document grammar: before the root
/// element (where comments/PIs/doctype may still appear) and after it
/// (where only trailing comments/PIs precede end-of-document).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    Content,
    End,
}

/// One frame of open-element state: which element grammar governs it
/// and which of that grammar's two states it is currently in.
struct Frame {
    key: (CompactId, CompactId),
    state: GrammarState,
}

/// Tracks the currently active grammar position through a whole
/// document: the document-level state before/after the root element,
/// and a stack of open-element frames.
pub struct GrammarStack {
    doc_state: DocState,
    frames: Vec<Frame>,
    cache: GrammarCache,
}

impl GrammarStack {
    pub fn new() -> Self {
        Self { doc_state: DocState::Content, frames: Vec::new(), cache: GrammarCache::new() }
    }

    pub fn doc_state(&self) -> DocState {
        self.doc_state
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The `(URI_id, LocalName_id)` of the innermost open element.
    pub fn current_key(&self) -> Option<(CompactId, CompactId)> {
        self.frames.last().map(|f| f.key)
    }

    /// The production at `id` in the current element's current state.
    pub fn production_at(&mut self, id: u32) -> Option<Production> {
        let (grammar, state, _) = self.current()?;
        grammar.get(state, id)
    }

    /// Whether `event` is valid at the document level right now
    /// (comments/PIs/doctype before the root; comments/PIs and
    /// end-of-document after it).
    pub fn doc_event_allowed(&self, event: EventKind) -> bool {
        match self.doc_state {
            DocState::Content => matches!(
                event,
                EventKind::Comment | EventKind::ProcessingInstruction | EventKind::DocType | EventKind::StartElement
            ),
            DocState::End => matches!(event, EventKind::Comment | EventKind::ProcessingInstruction | EventKind::EndDocument),
        }
    }

    /// Pushes a new element frame for `key`, entering its start-tag
    /// content state. Moves the document grammar to `DocState::End`
    /// once the root element has been opened.
    pub fn push_element(&mut self, key: (CompactId, CompactId)) {
        self.cache.get_or_create(key);
        self.frames.push(Frame { key, state: GrammarState::StartTagContent });
        if self.frames.len() == 1 {
            self.doc_state = DocState::End;
        }
    }

    /// Pops the current element frame on its end tag.
    pub fn pop_element(&mut self) {
        self.frames.pop();
    }

    fn current(&mut self) -> Option<(&mut ElementGrammar, GrammarState, (CompactId, CompactId))> {
        let frame = self.frames.last()?;
        let key = frame.key;
        let state = frame.state;
        Some((self.cache.get_or_create(key), state, key))
    }

    /// Looks up the production index for `event`/`qname` in the
    /// current element's current state (or `None` if no element is
    /// open, meaning the document grammar governs instead).
    pub fn find_in_current_element(&mut self, event: EventKind, qname: Option<(CompactId, CompactId)>) -> Option<u32> {
        let (grammar, state, _) = self.current()?;
        grammar.find(state, event, qname)
    }

    pub fn current_log(&mut self) -> Option<u32> {
        let (grammar, state, _) = self.current()?;
        Some(grammar.log(state))
    }

    /// Applies the transition for `production_id` at the current
    /// element, advancing its state, and promotes a wildcard match to
    /// a learned specific production when `qname` is given.
    pub fn apply(&mut self, event: EventKind, qname: Option<(CompactId, CompactId)>, production_id: u32) {
        let Some(frame) = self.frames.last() else { return };
        let key = frame.key;
        let state = frame.state;
        let grammar = self.cache.get_or_create(key);
        let Some(production) = grammar.get(state, production_id) else { return };
        if let Some(qname) = qname {
            grammar.learn(state, event, qname, production.next);
        }
        self.frames.last_mut().unwrap().state = production.next;
    }
}

impl Default for GrammarStack {
    fn default() -> Self {
        Self::new()
    }
}
