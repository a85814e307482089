//! Generic selection/navigation state shared by the specimen and taxa
//! review screens.
//!
//! State advances `Idle → Loading → (Loaded | Error)` and resets on every
//! new selection. Each selection carries a generation token: results from a
//! superseded selection are discarded rather than clobbering the current
//! one.

use crate::tagging::aggregate::prefer_edit_files;
use crate::tagging::TaggedFile;

use std::collections::HashMap;

/// Items the selector can navigate over need a stable key.
pub trait SelectorItem {
    fn key(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Per-item tag counts, keyed by item key then tag letter. A count is the
/// number of distinct base+extension identities carrying the letter.
#[derive(Debug, Clone, Default)]
pub struct TagCounts {
    counts: HashMap<String, HashMap<char, usize>>,
}

impl TagCounts {
    pub fn set(&mut self, key: &str, letter: char, count: usize) {
        self.counts
            .entry(key.to_string())
            .or_default()
            .insert(letter, count);
    }

    pub fn get(&self, key: &str, letter: char) -> usize {
        self.counts
            .get(key)
            .and_then(|by_letter| by_letter.get(&letter))
            .copied()
            .unwrap_or(0)
    }

    /// Reset before recomputing to avoid stale entries.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

type ImageFilter = Box<dyn Fn(&TaggedFile) -> bool + Send>;

/// Selection state machine, parameterized over the item type and its tag
/// letter. Loading itself stays with the caller; the selector owns the
/// bookkeeping (phase, generation, image list, counts).
pub struct Selector<T: SelectorItem> {
    tag_letter: char,
    selected: Option<T>,
    selected_key: Option<String>,
    images: Vec<TaggedFile>,
    phase: LoadPhase,
    generation: u64,
    filter: Option<ImageFilter>,
    pub counts: TagCounts,
}

impl<T: SelectorItem + Clone> Selector<T> {
    pub fn new(tag_letter: char) -> Self {
        Self {
            tag_letter,
            selected: None,
            selected_key: None,
            images: Vec::new(),
            phase: LoadPhase::Idle,
            generation: 0,
            filter: None,
            counts: TagCounts::default(),
        }
    }

    /// Install a post-load filter applied before edit-preference dedup.
    pub fn with_filter(mut self, filter: impl Fn(&TaggedFile) -> bool + Send + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn tag_letter(&self) -> char {
        self.tag_letter
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn images(&self) -> &[TaggedFile] {
        &self.images
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Begin a selection: record the item, clear the image list, enter
    /// `Loading`, and hand back the generation token the load must present
    /// on completion.
    pub fn begin_select(&mut self, item: &T) -> u64 {
        self.selected = Some(item.clone());
        self.selected_key = Some(item.key());
        self.images.clear();
        self.phase = LoadPhase::Loading;
        self.generation += 1;
        self.generation
    }

    /// Complete a selection. A stale generation is discarded outright. On
    /// success the filter, edit-preference dedup and name sort are applied;
    /// on failure the image list stays empty and the error message is
    /// returned for the caller to surface as a transient notice — the
    /// selection itself is not rolled back.
    pub fn finish_select(
        &mut self,
        generation: u64,
        result: anyhow::Result<Vec<TaggedFile>>,
    ) -> Option<String> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale load discarded");
            return None;
        }
        match result {
            Ok(files) => {
                let files: Vec<TaggedFile> = match &self.filter {
                    Some(filter) => files.into_iter().filter(|f| filter(f)).collect(),
                    None => files,
                };
                let mut display = prefer_edit_files(&files);
                display.sort_by(|a, b| a.name.cmp(&b.name));
                self.images = display;
                self.phase = LoadPhase::Loaded;
                None
            }
            Err(e) => {
                self.images.clear();
                self.phase = LoadPhase::Error;
                Some(format!("Failed to load images: {e}"))
            }
        }
    }

    /// Select an item and run the load to completion. Selection loads never
    /// overlap in this application, but the generation bookkeeping is the
    /// same as for the split form.
    pub fn select_with(
        &mut self,
        item: &T,
        loader: impl FnOnce(&T) -> anyhow::Result<Vec<TaggedFile>>,
    ) -> Option<String> {
        let generation = self.begin_select(item);
        let result = loader(item);
        self.finish_select(generation, result)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.selected_key = None;
        self.images.clear();
        self.phase = LoadPhase::Idle;
    }

    pub fn tag_count(&self, item: &T, letter: char) -> usize {
        self.counts.get(&item.key(), letter)
    }

    /// Find the next item with a zero count for the configured tag letter.
    ///
    /// With no current selection, returns the first untagged item. Otherwise
    /// scans from `current + direction` to the boundary, then wraps into the
    /// other segment. `None` means every item is tagged.
    pub fn navigate_to_next_untagged(
        &self,
        current: Option<usize>,
        items: &[T],
        direction: isize,
    ) -> Option<usize> {
        let untagged = |idx: usize| self.counts.get(&items[idx].key(), self.tag_letter) == 0;

        let current = match current {
            None => {
                return (0..items.len()).find(|&i| untagged(i));
            }
            Some(current) => current as isize,
        };
        let len = items.len() as isize;

        // Forward/backward from the current position to the boundary.
        let mut i = current + direction;
        while i >= 0 && i < len {
            if untagged(i as usize) {
                return Some(i as usize);
            }
            i += direction;
        }

        // Wrap around into the remaining segment.
        let mut i = if direction > 0 { 0 } else { len - 1 };
        while if direction > 0 { i < current } else { i > current } {
            if untagged(i as usize) {
                return Some(i as usize);
            }
            i += direction;
        }

        None
    }
}
