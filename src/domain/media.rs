// src/domain/media.rs
//! Ordered, captioned media collections attached to an auction (photos,
//! documents, service records) and the merge of an edit submission into an
//! already persisted collection.
//!
//! A submission lists every entry the client wants to keep, in display order.
//! Entries tagged `is_existing` point at persisted items; the others are
//! placeholders for freshly uploaded files, matched positionally against the
//! submitted files. Captions run parallel to the order list.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::core::{Errors, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Photos,
    Documents,
    ServiceRecords,
}

impl MediaKind {
    pub fn field(&self) -> &'static str {
        match self {
            MediaKind::Photos => "photos",
            MediaKind::Documents => "documents",
            MediaKind::ServiceRecords => "serviceRecords",
        }
    }

    pub fn min_items(&self) -> usize {
        match self {
            MediaKind::Photos => 1,
            MediaKind::Documents | MediaKind::ServiceRecords => 0,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: Uuid,
    pub url: String,
    #[serde(default)]
    pub caption: String,
    pub storage_key: String,
    pub filename: String,
}

/// Identity of an upload as seen by the browser before it reaches us.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSignature {
    pub filename: String,
    pub size: u64,
    pub last_modified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub signature: FileSignature,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub id: String,
    pub is_existing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSubmission {
    pub order: Vec<OrderEntry>,
    pub captions: Vec<String>,
    pub removed: Vec<Uuid>,
    pub new_files: Vec<NewFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Existing(MediaItem),
    New { file: usize, caption: String },
}

/// Validated outcome of a submission, before any file has been uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub kind: MediaKind,
    pub slots: Vec<Slot>,
    pub removed: Vec<MediaItem>,
}

fn caption_at(captions: &[String], index: usize) -> String {
    captions.get(index).cloned().unwrap_or_default()
}

/// Checks a submission against the persisted collection and lays out the
/// final order. Nothing is uploaded or deleted here.
pub fn plan_merge(
    kind: MediaKind,
    existing: &[MediaItem],
    submission: &MediaSubmission,
) -> Result<MergePlan, Errors> {
    let field = kind.field();
    let mut errors = Vec::new();

    let removed_ids: HashSet<Uuid> = submission.removed.iter().copied().collect();
    let mut seen_existing = HashSet::new();
    let mut slots = Vec::with_capacity(submission.order.len());
    let mut next_file = 0;

    for (index, entry) in submission.order.iter().enumerate() {
        let caption = caption_at(&submission.captions, index);
        if entry.is_existing {
            let item = Uuid::parse_str(&entry.id)
                .ok()
                .and_then(|id| existing.iter().find(|item| item.id == id));
            match item {
                None => errors.push(FieldError::new(
                    field,
                    format!("Unknown existing item: {}", entry.id),
                )),
                Some(item) if removed_ids.contains(&item.id) => errors.push(FieldError::new(
                    field,
                    format!("Item {} is both kept and removed", item.id),
                )),
                Some(item) if !seen_existing.insert(item.id) => errors.push(FieldError::new(
                    field,
                    format!("Item {} appears more than once", item.id),
                )),
                Some(item) => slots.push(Slot::Existing(MediaItem {
                    caption,
                    ..item.clone()
                })),
            }
        } else {
            slots.push(Slot::New {
                file: next_file,
                caption,
            });
            next_file += 1;
        }
    }

    if next_file != submission.new_files.len() {
        errors.push(FieldError::new(
            field,
            format!(
                "Expected {} new files but received {}",
                next_file,
                submission.new_files.len()
            ),
        ));
    }

    let mut signatures = HashSet::new();
    for file in &submission.new_files {
        if !signatures.insert(&file.signature) {
            errors.push(FieldError::new(
                field,
                format!("Duplicate file: {}", file.signature.filename),
            ));
        }
    }

    if slots.len() < kind.min_items() && errors.is_empty() {
        errors.push(FieldError::new(field, "At least one photo is required"));
    }

    if !errors.is_empty() {
        return Err(Errors::Validation(errors));
    }

    let removed = existing
        .iter()
        .filter(|item| !seen_existing.contains(&item.id))
        .cloned()
        .collect();

    Ok(MergePlan {
        kind,
        slots,
        removed,
    })
}

impl MergePlan {
    pub fn new_file_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::New { .. }))
            .count()
    }

    /// Fills the new slots with uploaded items, `uploaded[i]` belonging to
    /// the i-th submitted file.
    pub fn finish(self, uploaded: &[MediaItem]) -> Result<Vec<MediaItem>, Errors> {
        self.slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Existing(item) => Ok(item),
                Slot::New { file, caption } => uploaded
                    .get(file)
                    .map(|item| MediaItem {
                        caption,
                        ..item.clone()
                    })
                    .ok_or_else(|| Errors::Internal(format!("missing upload for file {}", file))),
            })
            .collect()
    }
}

/// Outcome of staging a file in a [`MediaDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Added,
    Duplicate { warning: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DraftEntry {
    Existing(MediaItem),
    New(NewFile),
}

/// Client-side editing buffer for one collection: stage uploads, drag to
/// reorder, caption and remove, then turn it into a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDraft {
    entries: Vec<(DraftEntry, String)>,
    removed: Vec<Uuid>,
}

impl MediaDraft {
    pub fn from_existing(items: &[MediaItem]) -> Self {
        MediaDraft {
            entries: items
                .iter()
                .map(|item| (DraftEntry::Existing(item.clone()), item.caption.clone()))
                .collect(),
            removed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Duplicates (same filename, size and modification time) are left out.
    pub fn stage(&mut self, file: NewFile) -> StageOutcome {
        let duplicate = self.entries.iter().any(|(entry, _)| match entry {
            DraftEntry::New(staged) => staged.signature == file.signature,
            DraftEntry::Existing(_) => false,
        });
        if duplicate {
            return StageOutcome::Duplicate {
                warning: format!("{} has already been added", file.signature.filename),
            };
        }
        self.entries.push((DraftEntry::New(file), String::new()));
        StageOutcome::Added
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        true
    }

    pub fn set_caption(&mut self, index: usize, caption: &str) -> bool {
        match self.entries.get_mut(index) {
            Some((_, current)) => {
                *current = caption.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        let (entry, _) = self.entries.remove(index);
        if let DraftEntry::Existing(item) = entry {
            self.removed.push(item.id);
        }
        true
    }

    pub fn into_submission(self) -> MediaSubmission {
        let mut submission = MediaSubmission {
            removed: self.removed,
            ..MediaSubmission::default()
        };
        for (index, (entry, caption)) in self.entries.into_iter().enumerate() {
            match entry {
                DraftEntry::Existing(item) => submission.order.push(OrderEntry {
                    id: item.id.to_string(),
                    is_existing: true,
                }),
                DraftEntry::New(file) => {
                    submission.order.push(OrderEntry {
                        id: format!("new-{}", index),
                        is_existing: false,
                    });
                    submission.new_files.push(file);
                }
            }
            submission.captions.push(caption);
        }
        submission
    }
}
