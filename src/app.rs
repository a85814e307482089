use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent};
use ratatui::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{Config, SourceConfig};
use crate::db::Database;
use crate::export::{self, ExportFormat};
use crate::fsops::FsFolder;
use crate::occurrence::{DbParams, OccurrenceClient};
use crate::reconcile::{self, PhotographedTaxon};
use crate::scanner::{FolderScanResult, FolderScanner, PhotoFolder};
use crate::selector::{Selector, SelectorItem};
use crate::sheets::postprocess::{decode_checklist, decode_field_notes, ChecklistRecord, FieldNoteRecord};
use crate::sheets::SheetRow;
use crate::specimen::CollectorTable;
use crate::tagging::aggregate::count_tagged_files;
use crate::tagging::review;
use crate::tagging::{has_tag, parse_filename, toggle_tag_letter, TaggedFile};
use crate::taxonomy::TaxonomyRecord;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    SpecimenPhotos,
    TaxaPhotos,
}

impl Module {
    pub fn title(&self) -> &'static str {
        match self {
            Module::SpecimenPhotos => "Specimen photos",
            Module::TaxaPhotos => "Taxa photos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderListKind {
    Matched,
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxaListKind {
    Photographed,
    WithoutPhotos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Items,
    Images,
}

/// Transient user-facing notification.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub error: bool,
    raised_at: Instant,
}

impl Notice {
    const TIMEOUT: Duration = Duration::from_millis(3500);

    fn new(message: impl Into<String>, error: bool) -> Self {
        Self {
            message: message.into(),
            error,
            raised_at: Instant::now(),
        }
    }

    fn expired(&self) -> bool {
        self.raised_at.elapsed() > Self::TIMEOUT
    }
}

pub struct App {
    pub config: Config,
    pub db: Database,
    scanner: FolderScanner,
    collectors: CollectorTable,

    pub module: Module,
    pub focus: FocusPane,

    // Source datasets
    pub checklist: Vec<ChecklistRecord>,
    pub field_notes: Vec<FieldNoteRecord>,
    pub scan: FolderScanResult,

    // Reconciled views, rebuilt whenever any source changes
    pub photographed_taxa: Vec<PhotographedTaxon>,
    pub taxa_without_photos: Vec<TaxonomyRecord>,

    // Selection state, one selector per review screen
    pub folder_selector: Selector<PhotoFolder>,
    pub taxa_selector: Selector<PhotographedTaxon>,
    pub folder_list_kind: FolderListKind,
    pub taxa_list_kind: TaxaListKind,

    // Item lists as displayed, sorted
    folder_items: Vec<PhotoFolder>,
    taxa_items: Vec<PhotographedTaxon>,

    pub item_cursor: usize,
    pub image_cursor: usize,

    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let scanner = FolderScanner::new(config.collection.image_extensions.clone());
        let collectors = if config.collectors.is_empty() {
            CollectorTable::defaults()
        } else {
            CollectorTable::new(config.collectors.clone())
        };

        let specimen_tag = config.review.specimen_tag;
        let taxon_tag = config.review.taxon_tag;
        let folder_selector = Selector::new(specimen_tag);
        // The taxa screen only shows photos that already passed specimen
        // review.
        let taxa_selector =
            Selector::new(taxon_tag).with_filter(move |f| has_tag(&f.name, specimen_tag));

        let mut app = Self {
            config,
            db,
            scanner,
            collectors,
            module: Module::SpecimenPhotos,
            focus: FocusPane::Items,
            checklist: Vec::new(),
            field_notes: Vec::new(),
            scan: FolderScanResult::default(),
            photographed_taxa: Vec::new(),
            taxa_without_photos: Vec::new(),
            folder_selector,
            taxa_selector,
            folder_list_kind: FolderListKind::Matched,
            taxa_list_kind: TaxaListKind::Photographed,
            folder_items: Vec::new(),
            taxa_items: Vec::new(),
            item_cursor: 0,
            image_cursor: 0,
            notice: None,
            should_quit: false,
        };
        app.reload_data();
        Ok(app)
    }

    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        while !self.should_quit {
            if self.notice.as_ref().map(|n| n.expired()).unwrap_or(false) {
                self.notice = None;
            }

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key)?;
                }
            }
        }
        Ok(())
    }

    pub fn set_notice(&mut self, message: impl Into<String>, error: bool) {
        let notice = Notice::new(message, error);
        if notice.error {
            tracing::warn!("{}", notice.message);
        } else {
            tracing::info!("{}", notice.message);
        }
        self.notice = Some(notice);
    }

    // ----- data loading -------------------------------------------------

    /// Load both sheets (file first, cache fallback), rescan the collection
    /// root, rebuild the reconciled views and all tag counts. Every step is
    /// tolerant: a failing source leaves its dataset empty and raises a
    /// notice instead of aborting the session.
    pub fn reload_data(&mut self) {
        let checklist_source = self.config.sources.checklist.clone();
        match self.load_sheet_rows("checklist", &checklist_source) {
            Ok((rows, from_cache)) => {
                self.checklist = decode_checklist(&rows);
                if from_cache {
                    self.set_notice("Checklist: using cached sheet", false);
                }
            }
            Err(e) => {
                self.checklist.clear();
                self.set_notice(format!("Checklist: {e}"), true);
            }
        }

        let field_notes_source = self.config.sources.field_notes.clone();
        match self.load_sheet_rows("field_notes", &field_notes_source) {
            Ok((rows, from_cache)) => {
                self.field_notes = decode_field_notes(&rows, &self.collectors);
                if from_cache {
                    self.set_notice("Field notes: using cached sheet", false);
                }
                let flagged = self.field_notes.iter().filter(|r| r.flag.is_some()).count();
                if flagged > 0 {
                    self.set_notice(
                        format!("Field notes: {flagged} rows with unknown collector"),
                        false,
                    );
                }
            }
            Err(e) => {
                self.field_notes.clear();
                self.set_notice(format!("Field notes: {e}"), true);
            }
        }

        let root = self.config.collection.root.clone();
        match self.scanner.scan_root(&root) {
            Ok(scan) => self.scan = scan,
            Err(e) => {
                self.scan = FolderScanResult::default();
                self.set_notice(format!("Folder scan: {e}"), true);
            }
        }

        self.rebuild_views();
        self.recompute_folder_counts();
        self.recompute_taxa_counts();
        self.rebuild_item_lists();
    }

    /// Read a sheet from its file, falling back to the cache when the file
    /// is unavailable. Returns the rows and whether they came from cache.
    fn load_sheet_rows(
        &self,
        source_name: &str,
        source: &SourceConfig,
    ) -> Result<(Vec<SheetRow>, bool)> {
        let path = source.resolved_path(&self.config.collection.root);
        if path.exists() {
            let bytes = std::fs::read(&path)?;
            let rows = crate::sheets::read_sheet(&bytes, &source.mapping)?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.db.put_sheet(source_name, &file_name, &rows)?;
            return Ok((rows, false));
        }

        if let Some(cached) = self.db.get_sheet(source_name)? {
            return Ok((cached.rows, true));
        }
        bail!("sheet not found at {}", path.display())
    }

    fn rebuild_views(&mut self) {
        self.photographed_taxa = reconcile::build_photographed_taxa(
            &self.checklist,
            &self.field_notes,
            &self.scan.matching,
            &self.collectors,
        );
        self.taxa_without_photos = reconcile::taxa_without_photos(&self.checklist, &self.field_notes);
        self.folder_selector.clear_selection();
        self.taxa_selector.clear_selection();
    }

    fn rebuild_item_lists(&mut self) {
        let mut folders = match self.folder_list_kind {
            FolderListKind::Matched => self.scan.matching.clone(),
            FolderListKind::Unmatched => self.scan.nonmatching.clone(),
        };
        folders.sort_by(|a, b| a.folder_name.cmp(&b.folder_name));
        self.folder_items = folders;

        self.taxa_items = match self.taxa_list_kind {
            TaxaListKind::Photographed => self.photographed_taxa.clone(),
            TaxaListKind::WithoutPhotos => self
                .taxa_without_photos
                .iter()
                .map(|taxonomy| PhotographedTaxon {
                    taxonomy: taxonomy.clone(),
                    folders: Vec::new(),
                })
                .collect(),
        };

        let len = self.current_item_count();
        if self.item_cursor >= len {
            self.item_cursor = len.saturating_sub(1);
        }
        self.image_cursor = 0;
    }

    /// Specimen-tag counts per folder, over every folder that has images —
    /// the unmatched list is reviewable too.
    fn recompute_folder_counts(&mut self) {
        let letter = self.config.review.specimen_tag;
        self.folder_selector.counts.clear();
        for folder in self
            .scan
            .matching
            .iter()
            .chain(self.scan.nonmatching.iter())
            .filter(|f| f.has_images)
        {
            match self.scanner.list_images(&folder.full_path) {
                Ok(files) => {
                    let count = count_tagged_files(&files, letter);
                    self.folder_selector.counts.set(&folder.key(), letter, count);
                }
                Err(e) => {
                    tracing::warn!(folder = %folder.folder_name, "count failed: {e}");
                }
            }
        }
    }

    /// Taxa counts: `s` totals the specimen-reviewed files across the
    /// taxon's folders; `t` counts taxon-reviewed identities among them.
    fn recompute_taxa_counts(&mut self) {
        let specimen_tag = self.config.review.specimen_tag;
        let taxon_tag = self.config.review.taxon_tag;
        self.taxa_selector.counts.clear();
        for taxon in &self.photographed_taxa {
            let key = SelectorItem::key(taxon);
            let mut s_count = 0;
            let mut t_count = 0;
            for folder in &taxon.folders {
                match self.scanner.list_images(&folder.full_path) {
                    Ok(files) => {
                        let s_files: Vec<TaggedFile> = files
                            .into_iter()
                            .filter(|f| has_tag(&f.name, specimen_tag))
                            .collect();
                        s_count += s_files.len();
                        t_count += count_tagged_files(&s_files, taxon_tag);
                    }
                    Err(e) => {
                        tracing::warn!(folder = %folder.folder_name, "count failed: {e}");
                    }
                }
            }
            self.taxa_selector.counts.set(&key, specimen_tag, s_count);
            self.taxa_selector.counts.set(&key, taxon_tag, t_count);
        }
    }

    // ----- accessors for the UI ----------------------------------------

    pub fn folder_items(&self) -> &[PhotoFolder] {
        &self.folder_items
    }

    pub fn taxa_items(&self) -> &[PhotographedTaxon] {
        &self.taxa_items
    }

    pub fn current_item_count(&self) -> usize {
        match self.module {
            Module::SpecimenPhotos => self.folder_items.len(),
            Module::TaxaPhotos => self.taxa_items.len(),
        }
    }

    pub fn current_images(&self) -> &[TaggedFile] {
        match self.module {
            Module::SpecimenPhotos => self.folder_selector.images(),
            Module::TaxaPhotos => self.taxa_selector.images(),
        }
    }

    pub fn current_image(&self) -> Option<&TaggedFile> {
        self.current_images().get(self.image_cursor)
    }

    pub fn is_loading_images(&self) -> bool {
        match self.module {
            Module::SpecimenPhotos => self.folder_selector.is_loading(),
            Module::TaxaPhotos => self.taxa_selector.is_loading(),
        }
    }

    pub fn selected_item_key(&self) -> Option<&str> {
        match self.module {
            Module::SpecimenPhotos => self.folder_selector.selected_key(),
            Module::TaxaPhotos => self.taxa_selector.selected_key(),
        }
    }

    // ----- key handling -------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.switch_module();
            }
            KeyCode::Char('m') => {
                self.toggle_list_kind();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(-1);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.focus = FocusPane::Items;
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if !self.current_images().is_empty() {
                    self.focus = FocusPane::Images;
                }
            }
            KeyCode::Enter => {
                if self.focus == FocusPane::Items {
                    self.select_current_item();
                }
            }
            KeyCode::Char('s') => {
                let letter = self.config.review.specimen_tag;
                self.toggle_tag_on_current_image(letter);
            }
            KeyCode::Char('t') => {
                let letter = self.config.review.taxon_tag;
                self.toggle_tag_on_current_image(letter);
            }
            KeyCode::Char('e') => {
                self.create_edit_copy_of_current_image();
            }
            KeyCode::Char('n') => {
                self.jump_to_untagged(1);
            }
            KeyCode::Char('p') => {
                self.jump_to_untagged(-1);
            }
            KeyCode::Char('r') => {
                self.set_notice("Reloading data...", false);
                self.reload_data();
            }
            KeyCode::Char('x') => {
                if let Err(e) = self.export_reports() {
                    self.set_notice(format!("Export failed: {e}"), true);
                }
            }
            KeyCode::Char('B') => {
                if let Err(e) = self.backup_occurrences() {
                    self.set_notice(format!("Backup failed: {e}"), true);
                }
            }
            KeyCode::Char('O') => {
                if let Err(e) = self.fetch_occurrences() {
                    self.set_notice(format!("Occurrence fetch failed: {e}"), true);
                }
            }
            KeyCode::Esc => {
                self.focus = FocusPane::Items;
            }
            _ => {}
        }
        Ok(())
    }

    fn switch_module(&mut self) {
        self.module = match self.module {
            Module::SpecimenPhotos => Module::TaxaPhotos,
            Module::TaxaPhotos => Module::SpecimenPhotos,
        };
        self.focus = FocusPane::Items;
        self.item_cursor = 0;
        self.image_cursor = 0;
        // Tags may have changed while reviewing on the other screen.
        match self.module {
            Module::SpecimenPhotos => self.recompute_folder_counts(),
            Module::TaxaPhotos => self.recompute_taxa_counts(),
        }
        self.rebuild_item_lists();
    }

    fn toggle_list_kind(&mut self) {
        match self.module {
            Module::SpecimenPhotos => {
                self.folder_list_kind = match self.folder_list_kind {
                    FolderListKind::Matched => FolderListKind::Unmatched,
                    FolderListKind::Unmatched => FolderListKind::Matched,
                };
                self.folder_selector.clear_selection();
            }
            Module::TaxaPhotos => {
                self.taxa_list_kind = match self.taxa_list_kind {
                    TaxaListKind::Photographed => TaxaListKind::WithoutPhotos,
                    TaxaListKind::WithoutPhotos => TaxaListKind::Photographed,
                };
                self.taxa_selector.clear_selection();
            }
        }
        self.focus = FocusPane::Items;
        self.item_cursor = 0;
        self.rebuild_item_lists();
    }

    fn move_cursor(&mut self, delta: isize) {
        match self.focus {
            FocusPane::Items => {
                let len = self.current_item_count();
                if len == 0 {
                    return;
                }
                let next = self.item_cursor as isize + delta;
                self.item_cursor = next.clamp(0, len as isize - 1) as usize;
            }
            FocusPane::Images => {
                let len = self.current_images().len();
                if len == 0 {
                    return;
                }
                let next = self.image_cursor as isize + delta;
                self.image_cursor = next.clamp(0, len as isize - 1) as usize;
            }
        }
    }

    /// Load images for the item under the cursor. The load runs to
    /// completion before control returns to the event loop; the selector's
    /// generation token still guards against a stale completion.
    fn select_current_item(&mut self) {
        self.image_cursor = 0;
        match self.module {
            Module::SpecimenPhotos => {
                let Some(item) = self.folder_items.get(self.item_cursor).cloned() else {
                    return;
                };
                let scanner = &self.scanner;
                let notice = self
                    .folder_selector
                    .select_with(&item, |folder| scanner.list_images(&folder.full_path));
                if let Some(message) = notice {
                    self.set_notice(message, true);
                }
            }
            Module::TaxaPhotos => {
                let Some(item) = self.taxa_items.get(self.item_cursor).cloned() else {
                    return;
                };
                let scanner = &self.scanner;
                let notice = self.taxa_selector.select_with(&item, |taxon| {
                    let mut files = Vec::new();
                    for folder in &taxon.folders {
                        files.extend(scanner.list_images(&folder.full_path)?);
                    }
                    Ok(files)
                });
                if let Some(message) = notice {
                    self.set_notice(message, true);
                }
            }
        }
    }

    /// Toggle `letter` on the highlighted image, keep the edit/original
    /// counterpart's tag area in sync, then refresh the view and counts.
    fn toggle_tag_on_current_image(&mut self, letter: char) {
        let Some(file) = self.current_image().cloned() else {
            return;
        };
        let Some(parent) = file.path.parent().map(PathBuf::from) else {
            return;
        };

        let result = self.apply_tag_toggle(&file, &parent, letter);
        match result {
            Ok(new_name) => {
                self.refresh_after_file_change();
                self.set_notice(format!("Renamed to {new_name}"), false);
            }
            Err(e) => self.set_notice(format!("Tag toggle failed: {e}"), true),
        }
    }

    fn apply_tag_toggle(
        &self,
        file: &TaggedFile,
        parent: &PathBuf,
        letter: char,
    ) -> Result<String> {
        let folder = FsFolder::new(parent);
        let new_name = toggle_tag_letter(&file.name, letter);
        review::rename_file_in_folder(&folder, &file.name, &new_name)?;

        // Keep the paired variant's tag area identical.
        let files = self.scanner.list_images(parent)?;
        let parsed = parse_filename(&new_name);
        let counterpart = files.iter().find(|f| {
            let p = parse_filename(&f.name);
            p.base == parsed.base && p.ext == parsed.ext && p.edit != parsed.edit
        });
        if let Some(counterpart) = counterpart {
            let synced = review::sync_edit_tag(&new_name, &counterpart.name);
            if synced != counterpart.name {
                review::rename_file_in_folder(&folder, &counterpart.name, &synced)?;
            }
        }

        Ok(new_name)
    }

    fn create_edit_copy_of_current_image(&mut self) {
        let Some(file) = self.current_image().cloned() else {
            return;
        };
        let Some(parent) = file.path.parent().map(PathBuf::from) else {
            return;
        };
        let folder = FsFolder::new(&parent);

        match review::create_edit_copy(&folder, &file.name) {
            Ok(new_name) => {
                self.refresh_after_file_change();
                self.set_notice(format!("Created {new_name}"), false);
            }
            Err(e) => self.set_notice(format!("Edit copy failed: {e}"), true),
        }
    }

    /// Re-list the selected item's images and bring the current module's
    /// counts up to date after a rename or copy.
    fn refresh_after_file_change(&mut self) {
        let cursor = self.image_cursor;
        match self.module {
            Module::SpecimenPhotos => {
                if let Some(item) = self.folder_selector.selected().cloned() {
                    let scanner = &self.scanner;
                    self.folder_selector
                        .select_with(&item, |folder| scanner.list_images(&folder.full_path));
                }
                self.recompute_folder_counts();
            }
            Module::TaxaPhotos => {
                if let Some(item) = self.taxa_selector.selected().cloned() {
                    let scanner = &self.scanner;
                    self.taxa_selector.select_with(&item, |taxon| {
                        let mut files = Vec::new();
                        for folder in &taxon.folders {
                            files.extend(scanner.list_images(&folder.full_path)?);
                        }
                        Ok(files)
                    });
                }
                self.recompute_taxa_counts();
            }
        }
        let len = self.current_images().len();
        self.image_cursor = cursor.min(len.saturating_sub(1));
    }

    fn jump_to_untagged(&mut self, direction: isize) {
        let target = match self.module {
            Module::SpecimenPhotos => {
                let current = self.folder_selector.selected_key().and_then(|key| {
                    self.folder_items.iter().position(|f| f.key() == key)
                });
                self.folder_selector
                    .navigate_to_next_untagged(current, &self.folder_items, direction)
            }
            Module::TaxaPhotos => {
                let current = self.taxa_selector.selected_key().and_then(|key| {
                    self.taxa_items
                        .iter()
                        .position(|t| SelectorItem::key(t) == key)
                });
                self.taxa_selector
                    .navigate_to_next_untagged(current, &self.taxa_items, direction)
            }
        };

        match target {
            Some(idx) => {
                self.item_cursor = idx;
                self.focus = FocusPane::Items;
                self.select_current_item();
            }
            None => self.set_notice("No untagged items", false),
        }
    }

    // ----- occurrence store and reports --------------------------------

    fn occurrence_client(&self) -> Result<OccurrenceClient> {
        let occ = &self.config.occurrence;
        let (user, pass) = match (&occ.user, &occ.pass) {
            (Some(user), Some(pass)) => (user.clone(), pass.clone()),
            _ => bail!("occurrence credentials not configured"),
        };
        Ok(OccurrenceClient::new(
            occ.endpoint.clone(),
            DbParams {
                host: occ.host.clone(),
                port: occ.port,
                user,
                pass,
                database: occ.database.clone(),
            },
        ))
    }

    fn fetch_occurrences(&mut self) -> Result<()> {
        let client = self.occurrence_client()?;
        let records = client.fetch_collection()?;
        self.set_notice(format!("Fetched {} occurrence records", records.len()), false);
        Ok(())
    }

    fn backup_occurrences(&mut self) -> Result<()> {
        let client = self.occurrence_client()?;
        let dump = client.backup()?;

        let dir = Config::config_dir().join("backups");
        std::fs::create_dir_all(&dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("omoccurrences-{stamp}.sql"));
        std::fs::write(&path, dump.sql)?;

        self.set_notice(
            format!("Backed up {} rows to {}", dump.row_count, path.display()),
            false,
        );
        Ok(())
    }

    fn export_reports(&mut self) -> Result<()> {
        let dir = Config::config_dir().join("reports");
        std::fs::create_dir_all(&dir)?;

        let taxa_path = dir.join("photographed_taxa.csv");
        let taxa_count =
            export::export_photographed_taxa(&self.photographed_taxa, &taxa_path, ExportFormat::Csv)?;

        let specimens = reconcile::build_photographed_specimens(
            &self.checklist,
            &self.field_notes,
            &self.scan.matching,
            &self.collectors,
        );
        let specimens_path = dir.join("photographed_specimens.csv");
        let specimen_count = export::export_photographed_specimens(
            &specimens,
            &specimens_path,
            ExportFormat::Csv,
        )?;

        self.set_notice(
            format!(
                "Exported {taxa_count} taxa and {specimen_count} specimens to {}",
                dir.display()
            ),
            false,
        );
        Ok(())
    }
}
