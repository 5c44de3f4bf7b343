//! Note registry use-cases.
//!
//! # Responsibility
//! - Create/load/save/rename/delete notes through a full read-modify-write
//!   of the stored notes map.
//! - Resolve the active note on startup and after deletions.
//! - Drive the editor session: buffer, autosave debounce, save indicator,
//!   preview toggle and export.
//!
//! # Invariants
//! - No notes map is cached between operations; every call re-reads storage.
//! - After `open` and after every operation the stored map is non-empty
//!   (barring storage write failures, which are logged and tolerated).
//! - The active note id, when set, named a stored note at activation time.
//! - Storage failures never propagate to callers; operations are best-effort.
//! - A failed read aborts the operation before anything is written, so an
//!   unreadable map is never replaced by a synthesized one.
//! - Generated ids are never reissued, even after the note holding one is
//!   deleted.

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::model::note::{normalize_title, sorted_listing, Note, NoteId, NoteListItem, NotesMap};
use crate::service::export::{build_export, ExportError, ExportFile};
use crate::service::preview::{PreviewError, Renderer};
use crate::service::session::EditorSession;
use crate::store::{KvBackend, KvStore};
use log::{debug, error, info, warn};

/// Title of the note synthesized when the last note is deleted.
pub const DEFAULT_NOTE_TITLE: &str = "New Note";
/// Title of the note synthesized on first run.
pub const WELCOME_NOTE_TITLE: &str = "Welcome to Quick Note!";

/// Outcome of toggling the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewToggle {
    /// Back to the editor.
    Editing,
    /// Preview mode entered with the rendered HTML.
    Preview(String),
}

/// Registry facade over a key-value store and an editor session.
pub struct NoteRegistry<B: KvBackend, C: Clock = SystemClock> {
    store: KvStore<B>,
    clock: C,
    session: EditorSession,
}

impl<B: KvBackend, C: Clock> NoteRegistry<B, C> {
    /// Builds a registry and runs initial-load resolution.
    ///
    /// The active note becomes the stored session pointer when it still
    /// exists, otherwise the most recently modified note, otherwise a freshly
    /// created welcome note.
    pub fn open(store: KvStore<B>, clock: C, config: &SessionConfig) -> Self {
        let mut registry = Self {
            store,
            clock,
            session: EditorSession::new(config),
        };
        registry.resolve_active_note();
        registry
    }

    fn resolve_active_note(&mut self) {
        let Some(notes) = self.read_notes("registry_open") else {
            return;
        };
        let listing = sorted_listing(&notes);

        let pointer = self
            .store
            .last_note_id()
            .filter(|id| notes.contains_key(id));
        let target = pointer.or_else(|| listing.first().map(|item| item.id.clone()));

        match target {
            Some(id) => {
                let content = notes
                    .get(&id)
                    .map(|note| note.content.clone())
                    .unwrap_or_default();
                info!(
                    "event=registry_open module=registry status=ok notes={} note_id={}",
                    notes.len(),
                    id
                );
                self.activate(id, content);
            }
            None => {
                info!("event=registry_open module=registry status=empty notes=0");
                self.create_note(WELCOME_NOTE_TITLE);
            }
        }
    }

    /// Creates an empty note titled `title` and makes it active.
    ///
    /// Returns `None` without touching storage when `title` is blank or the
    /// stored map cannot be read.
    pub fn create_note(&mut self, title: &str) -> Option<NoteId> {
        let title = normalize_title(title)?;
        let now = self.clock.now_ms();
        let mut notes = self.read_notes("note_create")?;
        let last_issued = match self.store.last_issued_id_ms() {
            Ok(value) => value,
            Err(err) => {
                error!(
                    "event=note_create module=registry status=error error_code=store_read_failed error={}",
                    err
                );
                return None;
            }
        };
        let start_ms = last_issued.map_or(now, |issued| now.max(issued.saturating_add(1)));
        let id = NoteId::next_free(&notes, start_ms);
        notes.insert(id.clone(), Note::new(title, now));

        if let Some(issued) = id.millis() {
            if let Err(err) = self.store.set_last_issued_id_ms(issued) {
                error!(
                    "event=note_create module=registry status=error error_code=store_write_failed key=lastIssuedNoteId error={}",
                    err
                );
            }
        }
        self.persist_notes(&notes, "note_create");
        info!(
            "event=note_create module=registry status=ok note_id={} notes={}",
            id,
            notes.len()
        );
        self.activate(id.clone(), String::new());
        Some(id)
    }

    /// Makes `id` the active note. Unknown ids leave the session untouched.
    pub fn load_note(&mut self, id: &NoteId) -> bool {
        let Some(notes) = self.read_notes("note_load") else {
            return false;
        };
        match notes.get(id) {
            Some(note) => {
                self.activate(id.clone(), note.content.clone());
                debug!("event=note_load module=registry status=ok note_id={id}");
                true
            }
            None => {
                debug!("event=note_load module=registry status=not_found note_id={id}");
                false
            }
        }
    }

    /// Writes the editor buffer into the active note.
    ///
    /// Returns `false` when there is no active note, it no longer exists, or
    /// the stored map cannot be read.
    pub fn save_note(&mut self) -> bool {
        let Some(id) = self.session.active_note_id().cloned() else {
            return false;
        };
        let now = self.clock.now_ms();
        let Some(mut notes) = self.read_notes("note_save") else {
            return false;
        };
        let Some(note) = notes.get_mut(&id) else {
            warn!("event=note_save module=registry status=not_found note_id={id}");
            return false;
        };
        note.content = self.session.buffer().to_string();
        note.touch(now);

        self.persist_notes(&notes, "note_save");
        self.session.save_status_mut().schedule(now);
        debug!(
            "event=note_save module=registry status=ok note_id={} content_len={}",
            id,
            self.session.buffer().len()
        );
        true
    }

    /// Retitles `id`. Returns `false` without writing when the title is blank
    /// or the note does not exist.
    pub fn rename_note(&mut self, id: &NoteId, new_title: &str) -> bool {
        let Some(title) = normalize_title(new_title) else {
            return false;
        };
        let now = self.clock.now_ms();
        let Some(mut notes) = self.read_notes("note_rename") else {
            return false;
        };
        let Some(note) = notes.get_mut(id) else {
            debug!("event=note_rename module=registry status=not_found note_id={id}");
            return false;
        };
        note.title = title;
        note.touch(now);

        self.persist_notes(&notes, "note_rename");
        info!("event=note_rename module=registry status=ok note_id={id}");
        true
    }

    /// Removes `id` (absent ids are ignored), then activates the newest
    /// surviving note or synthesizes a default one when none remain.
    ///
    /// Does nothing when the stored map cannot be read.
    pub fn delete_note(&mut self, id: &NoteId) {
        let Some(mut notes) = self.read_notes("note_delete") else {
            return;
        };
        let removed = notes.remove(id).is_some();
        self.persist_notes(&notes, "note_delete");
        info!(
            "event=note_delete module=registry status=ok note_id={} removed={} remaining={}",
            id,
            removed,
            notes.len()
        );

        match sorted_listing(&notes).into_iter().next() {
            Some(newest) => {
                let content = notes
                    .get(&newest.id)
                    .map(|note| note.content.clone())
                    .unwrap_or_default();
                self.activate(newest.id, content);
            }
            None => {
                self.create_note(DEFAULT_NOTE_TITLE);
            }
        }
    }

    /// Lists `(id, title)` rows, most recently modified first.
    pub fn list_notes(&self) -> Vec<NoteListItem> {
        sorted_listing(&self.store.notes_map())
    }

    pub fn active_note_id(&self) -> Option<&NoteId> {
        self.session.active_note_id()
    }

    /// Reads the active note from storage.
    pub fn active_note(&self) -> Option<(NoteId, Note)> {
        let id = self.session.active_note_id()?;
        let mut notes = self.store.notes_map();
        notes.remove(id).map(|note| (id.clone(), note))
    }

    pub fn buffer(&self) -> &str {
        self.session.buffer()
    }

    /// Replaces the editor buffer without scheduling a save.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.session.set_buffer(text);
    }

    /// Replaces the editor buffer and restarts the autosave debounce.
    pub fn on_input(&mut self, text: impl Into<String>) {
        self.session.set_buffer(text);
        let now = self.clock.now_ms();
        self.session.autosave_mut().schedule(now);
    }

    /// Advances session timers. Hides an expired save indicator and runs a
    /// due autosave. Returns `true` when a save happened.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        if self.session.save_status_mut().fire_if_due(now) {
            debug!("event=save_status module=registry status=hidden");
        }
        if self.session.autosave_mut().fire_if_due(now) {
            return self.save_note();
        }
        false
    }

    /// Cancels any pending autosave and saves immediately.
    pub fn flush(&mut self) -> bool {
        self.session.autosave_mut().cancel();
        self.save_note()
    }

    pub fn save_status_visible(&self) -> bool {
        self.session.save_status_visible()
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Switches between editor and preview.
    ///
    /// Entering preview fails on a blank buffer or a renderer error; the
    /// session stays in edit mode and no note state changes.
    pub fn toggle_preview<R: Renderer>(
        &mut self,
        renderer: &R,
    ) -> Result<PreviewToggle, PreviewError> {
        if self.session.is_preview_mode() {
            self.session.set_preview_mode(false);
            return Ok(PreviewToggle::Editing);
        }

        let content = self.session.buffer();
        if content.trim().is_empty() {
            return Err(PreviewError::Empty);
        }
        match renderer.render(content) {
            Ok(html) => {
                self.session.set_preview_mode(true);
                Ok(PreviewToggle::Preview(html))
            }
            Err(err) => {
                warn!("event=preview_render module=registry status=error error={err}");
                Err(PreviewError::Render(err))
            }
        }
    }

    /// Packages the editor buffer for export, named after the active note.
    pub fn export_active(&self) -> Result<ExportFile, ExportError> {
        let title = self.active_note().map(|(_, note)| note.title);
        build_export(title.as_deref(), self.session.buffer())
    }

    pub fn store(&self) -> &KvStore<B> {
        &self.store
    }

    fn activate(&mut self, id: NoteId, content: String) {
        if let Err(err) = self.store.set_last_note_id(&id) {
            error!(
                "event=store_set module=registry status=error key=lastNoteId note_id={} error={}",
                id, err
            );
        }
        self.session.activate(id, content);
    }

    fn read_notes(&self, event: &'static str) -> Option<NotesMap> {
        match self.store.try_notes_map() {
            Ok(notes) => Some(notes),
            Err(err) => {
                error!(
                    "event={} module=registry status=error error_code=store_read_failed error={}",
                    event, err
                );
                None
            }
        }
    }

    fn persist_notes(&mut self, notes: &NotesMap, event: &'static str) {
        if let Err(err) = self.store.set_notes_map(notes) {
            error!(
                "event={} module=registry status=error error_code=store_write_failed error={}",
                event, err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteRegistry, PreviewToggle, DEFAULT_NOTE_TITLE, WELCOME_NOTE_TITLE};
    use crate::clock::ManualClock;
    use crate::config::SessionConfig;
    use crate::model::note::NoteId;
    use crate::service::preview::{PreviewError, RenderError, Renderer};
    use crate::store::{KvBackend, KvStore, MemoryKvBackend, StoreError, StoreResult, NOTES_KEY};
    use rusqlite::Error as SqliteError;
    use std::cell::Cell;

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _markdown: &str) -> Result<String, RenderError> {
            Err(RenderError::new("boom"))
        }
    }

    struct EchoRenderer;

    impl Renderer for EchoRenderer {
        fn render(&self, markdown: &str) -> Result<String, RenderError> {
            Ok(format!("<p>{markdown}</p>"))
        }
    }

    /// Backend whose writes always fail, as when storage quota is exhausted.
    #[derive(Default)]
    struct ReadOnlyBackend {
        inner: MemoryKvBackend,
    }

    impl KvBackend for ReadOnlyBackend {
        fn read(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::WriteRejected("quota exceeded".to_string()))
        }

        fn delete(&mut self, _key: &str) -> StoreResult<()> {
            Err(StoreError::WriteRejected("quota exceeded".to_string()))
        }
    }

    /// Backend whose next `n` reads of the notes map fail, as when another
    /// process holds the database lock past the busy timeout.
    struct FlakyReadBackend {
        inner: MemoryKvBackend,
        failing_reads: Cell<u32>,
    }

    impl FlakyReadBackend {
        fn fail_next_reads(&self, count: u32) {
            self.failing_reads.set(count);
        }
    }

    impl KvBackend for FlakyReadBackend {
        fn read(&self, key: &str) -> StoreResult<Option<String>> {
            let remaining = self.failing_reads.get();
            if key == NOTES_KEY && remaining > 0 {
                self.failing_reads.set(remaining - 1);
                return Err(SqliteError::InvalidQuery.into());
            }
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.write(key, value)
        }

        fn delete(&mut self, key: &str) -> StoreResult<()> {
            self.inner.delete(key)
        }
    }

    const TWO_NOTES: &str = r#"{
        "note_1": {"title": "Groceries", "content": "milk", "createdAt": 1, "lastModified": 5},
        "note_2": {"title": "Todo", "content": "", "createdAt": 2, "lastModified": 9}
    }"#;

    fn flaky_registry() -> NoteRegistry<FlakyReadBackend, ManualClock> {
        let backend = FlakyReadBackend {
            inner: MemoryKvBackend::new().with_entry(NOTES_KEY, TWO_NOTES),
            failing_reads: Cell::new(0),
        };
        NoteRegistry::open(
            KvStore::new(backend),
            ManualClock::new(1_000),
            &SessionConfig::default(),
        )
    }

    fn stored_notes(registry: &NoteRegistry<FlakyReadBackend, ManualClock>) -> Option<String> {
        registry.store().backend().inner.raw(NOTES_KEY).map(str::to_owned)
    }

    fn registry_at(start_ms: i64) -> (NoteRegistry<MemoryKvBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::new(start_ms);
        let registry = NoteRegistry::open(
            KvStore::new(MemoryKvBackend::new()),
            clock.clone(),
            &SessionConfig::default(),
        );
        (registry, clock)
    }

    #[test]
    fn first_open_synthesizes_welcome_note() {
        let (registry, _clock) = registry_at(1_000);
        let listing = registry.list_notes();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title, WELCOME_NOTE_TITLE);
        assert_eq!(registry.active_note_id(), Some(&listing[0].id));
    }

    #[test]
    fn create_rejects_blank_title() {
        let (mut registry, _clock) = registry_at(1_000);
        let before = registry.store().backend().raw(NOTES_KEY).map(str::to_owned);
        assert_eq!(registry.create_note("   "), None);
        assert_eq!(
            registry.store().backend().raw(NOTES_KEY).map(str::to_owned),
            before
        );
    }

    #[test]
    fn notes_created_in_same_millisecond_get_distinct_ids() {
        let (mut registry, _clock) = registry_at(1_000);
        let first = registry.create_note("a").expect("create should succeed");
        let second = registry.create_note("b").expect("create should succeed");
        assert_ne!(first, second);
        assert_eq!(registry.list_notes().len(), 3);
    }

    #[test]
    fn load_unknown_id_keeps_current_note() {
        let (mut registry, _clock) = registry_at(1_000);
        let current = registry.active_note_id().cloned();
        assert!(!registry.load_note(&NoteId::new("note_missing")));
        assert_eq!(registry.active_note_id().cloned(), current);
    }

    #[test]
    fn debounced_input_saves_once_after_quiet_period() {
        let (mut registry, clock) = registry_at(1_000);
        registry.on_input("m");
        clock.advance(200);
        registry.on_input("mi");
        clock.advance(400);
        assert!(!registry.tick(), "debounce restarted by second input");

        clock.advance(100);
        assert!(registry.tick());
        assert!(registry.save_status_visible());
        let (_, note) = registry.active_note().expect("active note");
        assert_eq!(note.content, "mi");

        clock.advance(2_000);
        assert!(!registry.tick());
        assert!(!registry.save_status_visible());
    }

    #[test]
    fn switching_notes_drops_pending_autosave() {
        let (mut registry, clock) = registry_at(1_000);
        let first = registry.active_note_id().cloned().expect("active note");
        clock.advance(1);
        registry.create_note("other").expect("create should succeed");
        registry.load_note(&first);
        registry.on_input("draft");
        registry.load_note(&first);
        clock.advance(1_000);
        assert!(!registry.tick());
    }

    #[test]
    fn delete_last_note_synthesizes_default() {
        let (mut registry, clock) = registry_at(1_000);
        let only = registry.active_note_id().cloned().expect("active note");
        clock.advance(10);
        registry.delete_note(&only);

        let listing = registry.list_notes();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title, DEFAULT_NOTE_TITLE);
        assert_ne!(listing[0].id, only);
        assert_eq!(registry.active_note_id(), Some(&listing[0].id));
    }

    #[test]
    fn preview_toggle_reports_errors_without_entering_preview() {
        let (mut registry, _clock) = registry_at(1_000);
        registry.set_buffer("   ");
        assert_eq!(
            registry.toggle_preview(&EchoRenderer),
            Err(PreviewError::Empty)
        );

        registry.set_buffer("# hi");
        assert!(matches!(
            registry.toggle_preview(&FailingRenderer),
            Err(PreviewError::Render(_))
        ));
        assert!(!registry.session().is_preview_mode());

        assert_eq!(
            registry.toggle_preview(&EchoRenderer),
            Ok(PreviewToggle::Preview("<p># hi</p>".to_string()))
        );
        assert!(registry.session().is_preview_mode());
        assert_eq!(
            registry.toggle_preview(&FailingRenderer),
            Ok(PreviewToggle::Editing)
        );
    }

    #[test]
    fn loading_a_note_leaves_preview_mode() {
        let (mut registry, _clock) = registry_at(1_000);
        let id = registry.active_note_id().cloned().expect("active note");
        registry.set_buffer("text");
        registry
            .toggle_preview(&EchoRenderer)
            .expect("preview should render");
        assert!(registry.load_note(&id));
        assert!(!registry.session().is_preview_mode());
    }

    #[test]
    fn export_uses_active_title_and_buffer() {
        let (mut registry, _clock) = registry_at(1_000);
        registry.create_note("Groceries List").expect("create should succeed");
        registry.set_buffer("milk");
        let file = registry.export_active().expect("export should succeed");
        assert_eq!(file.filename, "groceries_list.txt");
        assert_eq!(file.contents, "milk");
    }

    #[test]
    fn write_failures_are_tolerated() {
        let clock = ManualClock::new(1_000);
        let mut registry = NoteRegistry::open(
            KvStore::new(ReadOnlyBackend::default()),
            clock.clone(),
            &SessionConfig::default(),
        );
        // The welcome note could not be persisted but the session still works.
        assert!(registry.active_note_id().is_some());
        assert!(registry.list_notes().is_empty());
        registry.set_buffer("text");
        assert!(!registry.save_note());
        let id = registry.active_note_id().cloned().expect("active note");
        assert!(!registry.rename_note(&id, "x"));
        registry.delete_note(&id);
        assert!(registry.active_note_id().is_some());
    }

    #[test]
    fn failed_read_aborts_mutations_without_writing() {
        let mut registry = flaky_registry();
        let active = registry.active_note_id().cloned();
        assert_eq!(active, Some(NoteId::new("note_2")));
        let before = stored_notes(&registry);

        registry.store().backend().fail_next_reads(1);
        registry.delete_note(&NoteId::new("note_404"));
        assert_eq!(stored_notes(&registry), before);
        assert_eq!(registry.active_note_id().cloned(), active);

        registry.store().backend().fail_next_reads(1);
        assert_eq!(registry.create_note("Inbox"), None);

        registry.store().backend().fail_next_reads(1);
        registry.set_buffer("lost?");
        assert!(!registry.save_note());

        registry.store().backend().fail_next_reads(1);
        assert!(!registry.rename_note(&NoteId::new("note_1"), "Shopping"));

        registry.store().backend().fail_next_reads(1);
        assert!(!registry.load_note(&NoteId::new("note_1")));

        assert_eq!(stored_notes(&registry), before);
        let titles: Vec<String> = registry
            .list_notes()
            .into_iter()
            .map(|item| item.title)
            .collect();
        assert_eq!(titles, vec!["Todo", "Groceries"]);
    }

    #[test]
    fn failed_read_on_open_does_not_add_welcome_note() {
        let backend = FlakyReadBackend {
            inner: MemoryKvBackend::new().with_entry(NOTES_KEY, TWO_NOTES),
            failing_reads: Cell::new(1),
        };
        let registry = NoteRegistry::open(
            KvStore::new(backend),
            ManualClock::new(1_000),
            &SessionConfig::default(),
        );

        assert_eq!(registry.active_note_id(), None);
        assert_eq!(registry.list_notes().len(), 2);
        assert_eq!(
            stored_notes(&registry).as_deref(),
            Some(TWO_NOTES),
            "stored map must not be rewritten"
        );
    }
}
