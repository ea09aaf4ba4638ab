//! Per-browser view instances for the web UI.
//!
//! ## Design
//! - SessionStore: Arc<Mutex<Sessions>> shared across all connections
//! - Each mounted view gets a UUID; views never share state
//! - Each kind is capped; the least recently touched idle view makes way
//! - The lock is held only for synchronous view transitions, never across
//!   the inference await: callers `begin_*` under the lock, dispatch without
//!   it, then `complete_*` under the lock again

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::analysis::AnalysisView;
use crate::chat::{ChatView, Sender};
use crate::dataset::Problem;
use crate::lifecycle::RequestPhase;
use crate::render::{markdown_to_html, plain_text_to_html};

pub const DEFAULT_MAX_VIEWS: usize = 256;

#[derive(Debug)]
struct Slot<V> {
    view: V,
    /// Value of the store's tick when the view was last used.
    touched: u64,
}

#[derive(Debug)]
pub struct Sessions {
    analysis: HashMap<String, Slot<AnalysisView>>,
    chat: HashMap<String, Slot<ChatView>>,
    max_views: usize,
    tick: u64,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_VIEWS)
    }
}

impl Sessions {
    /// At most `max_views` views of each kind are kept (minimum one).
    pub fn with_capacity(max_views: usize) -> Self {
        Self { analysis: HashMap::new(), chat: HashMap::new(), max_views: max_views.max(1), tick: 0 }
    }

    pub fn analysis_len(&self) -> usize {
        self.analysis.len()
    }

    pub fn chat_len(&self) -> usize {
        self.chat.len()
    }
}

pub type SessionStore = Arc<Mutex<Sessions>>;

pub fn new_session_store(max_views: usize) -> SessionStore {
    Arc::new(Mutex::new(Sessions::with_capacity(max_views)))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Evict least recently touched idle views until one more fits. Views with a
/// request in flight are never evicted; returns false if none could go.
fn make_room<V>(map: &mut HashMap<String, Slot<V>>, max: usize, busy: impl Fn(&V) -> bool) -> bool {
    while map.len() >= max {
        let oldest = map
            .iter()
            .filter(|(_, slot)| !busy(&slot.view))
            .min_by_key(|(_, slot)| slot.touched)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(id) => {
                map.remove(&id);
                debug!(view = %id, "evicted idle view");
            }
            None => return false,
        }
    }
    true
}

fn next_tick(tick: &mut u64) -> u64 {
    *tick += 1;
    *tick
}

fn insert<V>(
    map: &mut HashMap<String, Slot<V>>,
    max: usize,
    tick: &mut u64,
    view: V,
    busy: impl Fn(&V) -> bool,
) -> Option<String> {
    if !make_room(map, max, busy) {
        warn!(max, "session store full; every view has a request in flight");
        return None;
    }
    let id = new_id();
    map.insert(id.clone(), Slot { view, touched: next_tick(tick) });
    Some(id)
}

fn touch<V, R>(
    map: &mut HashMap<String, Slot<V>>,
    tick: &mut u64,
    id: &str,
    f: impl FnOnce(&mut V) -> R,
) -> Option<R> {
    let slot = map.get_mut(id)?;
    slot.touched = next_tick(tick);
    Some(f(&mut slot.view))
}

/// Store an analysis view, returning its id. `None` if the store is full of
/// busy views.
pub fn insert_analysis(store: &SessionStore, view: AnalysisView) -> Option<String> {
    let mut guard = store.lock().ok()?;
    let Sessions { analysis, max_views, tick, .. } = &mut *guard;
    insert(analysis, *max_views, tick, view, AnalysisView::loading)
}

/// Store a chat view, returning its id. `None` if the store is full of busy
/// views.
pub fn insert_chat(store: &SessionStore, view: ChatView) -> Option<String> {
    let mut guard = store.lock().ok()?;
    let Sessions { chat, max_views, tick, .. } = &mut *guard;
    insert(chat, *max_views, tick, view, ChatView::loading)
}

/// Run `f` against the analysis view `id`. `None` if the id is unknown.
pub fn with_analysis<R>(store: &SessionStore, id: &str, f: impl FnOnce(&mut AnalysisView) -> R) -> Option<R> {
    let mut guard = store.lock().ok()?;
    let Sessions { analysis, tick, .. } = &mut *guard;
    touch(analysis, tick, id, f)
}

/// Run `f` against the chat view `id`. `None` if the id is unknown.
pub fn with_chat<R>(store: &SessionStore, id: &str, f: impl FnOnce(&mut ChatView) -> R) -> Option<R> {
    let mut guard = store.lock().ok()?;
    let Sessions { chat, tick, .. } = &mut *guard;
    touch(chat, tick, id, f)
}

// ---------------------------------------------------------------------------
// Snapshots (JSON bodies of the web API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshot {
    pub id: String,
    pub problem_id: String,
    pub problem: Option<Problem>,
    pub language: &'static str,
    pub source: String,
    pub phase: RequestPhase,
    pub loading: bool,
    pub error: bool,
    pub can_analyze: bool,
    pub output: String,
    pub output_html: String,
}

impl AnalysisSnapshot {
    pub fn of(id: &str, view: &AnalysisView) -> Self {
        Self {
            id: id.to_string(),
            problem_id: view.problem_id().to_string(),
            problem: view.problem().cloned(),
            language: view.draft().language.id,
            source: view.draft().text.clone(),
            phase: view.phase(),
            loading: view.loading(),
            error: view.error(),
            can_analyze: view.can_analyze(),
            output: view.output().to_string(),
            output_html: markdown_to_html(view.output()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub sender: Sender,
    pub label: &'static str,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub id: String,
    pub open: bool,
    pub phase: RequestPhase,
    pub loading: bool,
    pub error: Option<String>,
    pub messages: Vec<ChatEntry>,
}

impl ChatSnapshot {
    pub fn of(id: &str, view: &ChatView) -> Self {
        let messages = view
            .transcript()
            .iter()
            .map(|m| ChatEntry {
                sender: m.sender,
                label: m.sender.label(),
                text: m.text.clone(),
                html: match m.sender {
                    Sender::User => plain_text_to_html(&m.text),
                    Sender::Assistant => markdown_to_html(&m.text),
                },
            })
            .collect();
        Self {
            id: id.to_string(),
            open: view.is_open(),
            phase: view.phase(),
            loading: view.loading(),
            error: view.error().map(str::to_string),
            messages,
        }
    }
}
