// src/marketplace.rs
//! Shared, lockable marketplace state. Every change goes through
//! [`Marketplace::execute`]: the command runs against a copy, is journaled,
//! and only then replaces the live repository.
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{
    handle, plan_merge, Auction, AuctionDetails, AuctionId, AuctionPatch, Command, CommandSuccess, Errors,
    MediaItem, MediaKind, MediaSubmission, MergePlan, Repository, User,
};
use crate::persistence::json_file;
use crate::services::notifier::{deliver, notifications_for, Notifier};
use crate::services::storage::MediaStorage;

/// Media edits for one auction, one optional submission per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaChanges {
    pub photos: Option<MediaSubmission>,
    pub documents: Option<MediaSubmission>,
    pub service_records: Option<MediaSubmission>,
}

impl MediaChanges {
    fn take(&mut self, kind: MediaKind) -> Option<MediaSubmission> {
        match kind {
            MediaKind::Photos => self.photos.take(),
            MediaKind::Documents => self.documents.take(),
            MediaKind::ServiceRecords => self.service_records.take(),
        }
    }
}

const KINDS: [MediaKind; 3] = [MediaKind::Photos, MediaKind::Documents, MediaKind::ServiceRecords];

pub struct AuctionEdit {
    pub at: DateTime<Utc>,
    pub auction_id: AuctionId,
    pub editor: User,
    pub expected_version: Option<u64>,
    pub patch: AuctionPatch,
    pub media: MediaChanges,
}

pub struct Marketplace {
    repository: Mutex<Repository>,
    storage: Arc<dyn MediaStorage>,
    notifier: Arc<dyn Notifier>,
    journal: Option<PathBuf>,
}

impl Marketplace {
    pub fn new(repository: Repository, storage: Arc<dyn MediaStorage>, notifier: Arc<dyn Notifier>) -> Self {
        Marketplace {
            repository: Mutex::new(repository),
            storage,
            notifier,
            journal: None,
        }
    }

    /// Appends every successful command to `path`.
    pub fn with_journal(mut self, path: PathBuf) -> Self {
        self.journal = Some(path);
        self
    }

    pub fn storage(&self) -> &dyn MediaStorage {
        self.storage.as_ref()
    }

    /// The repository is only ever replaced whole, so a guard left behind
    /// by a panicking holder still points at a consistent value.
    fn lock(&self) -> MutexGuard<'_, Repository> {
        self.repository.lock().unwrap_or_else(|poisoned| {
            warn!("{:<12} --> recovering repository lock after a panic", "Marketplace");
            self.repository.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Runs `f` against the current repository.
    pub fn read<T>(&self, f: impl FnOnce(&Repository) -> T) -> Result<T, Errors> {
        let repository = self.lock();
        Ok(f(&repository))
    }

    pub fn execute(&self, command: Command) -> Result<CommandSuccess, Errors> {
        let (success, notifications) = {
            let mut repository = self.lock();
            let (success, next) = handle(command.clone(), repository.clone())?;
            if success.changes_nothing() {
                return Ok(success);
            }
            if let Some(path) = &self.journal {
                json_file::append_command(path, &command).map_err(|e| {
                    error!("{:<12} --> {}", "Journal", e);
                    Errors::Internal(e.to_string())
                })?;
            }
            let notifications = notifications_for(&success, &next);
            *repository = next;
            (success, notifications)
        };
        debug!("{:<12} --> {}", "Command", command_name(&success));
        deliver(self.notifier.as_ref(), &notifications);
        Ok(success)
    }

    /// Uploads the files of every plan in order. On failure everything
    /// uploaded so far is removed again.
    fn upload_all(&self, plans: Vec<(MergePlan, MediaSubmission)>) -> Result<Vec<(MediaKind, Vec<MediaItem>)>, Errors> {
        let mut uploaded_keys: Vec<String> = Vec::new();
        let mut finished = Vec::with_capacity(plans.len());
        for (plan, submission) in plans {
            let kind = plan.kind;
            let mut uploaded = Vec::with_capacity(submission.new_files.len());
            for file in &submission.new_files {
                match self.storage.upload(kind, file) {
                    Ok(item) => {
                        uploaded_keys.push(item.storage_key.clone());
                        uploaded.push(item);
                    }
                    Err(e) => {
                        warn!("{:<12} --> {}", "Media", e);
                        self.discard(&uploaded_keys);
                        return Err(Errors::Internal(e.to_string()));
                    }
                }
            }
            match plan.finish(&uploaded) {
                Ok(items) => finished.push((kind, items)),
                Err(e) => {
                    self.discard(&uploaded_keys);
                    return Err(e);
                }
            }
        }
        Ok(finished)
    }

    fn discard(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key) {
                warn!("{:<12} --> could not remove {}: {}", "Media", key, e);
            }
        }
    }

    fn new_keys(finished: &[(MediaKind, Vec<MediaItem>)], before: &[MediaItem]) -> Vec<String> {
        finished
            .iter()
            .flat_map(|(_, items)| items.iter())
            .filter(|item| !before.iter().any(|b| b.id == item.id))
            .map(|item| item.storage_key.clone())
            .collect()
    }

    pub fn create_auction(
        &self,
        at: DateTime<Utc>,
        auction_id: AuctionId,
        seller: User,
        details: AuctionDetails,
        mut media: MediaChanges,
    ) -> Result<Auction, Errors> {
        details.validate()?;
        let mut plans = Vec::new();
        for kind in KINDS {
            let submission = media.take(kind).unwrap_or_default();
            plans.push((plan_merge(kind, &[], &submission)?, submission));
        }
        let finished = self.upload_all(plans)?;
        let keys = Self::new_keys(&finished, &[]);

        let mut lists = finished.into_iter().map(|(_, items)| items);
        let command = Command::AddAuction {
            at,
            auction_id,
            seller,
            details,
            photos: lists.next().unwrap_or_default(),
            documents: lists.next().unwrap_or_default(),
            service_records: lists.next().unwrap_or_default(),
        };
        match self.execute(command) {
            Ok(CommandSuccess::AuctionAdded { auction }) => {
                info!("{:<12} --> created auction {}", "Auctions", auction.id);
                Ok(auction)
            }
            Ok(_) => Err(Errors::Internal("unexpected outcome of AddAuction".to_string())),
            Err(e) => {
                self.discard(&keys);
                Err(e)
            }
        }
    }

    /// Applies field changes and media edits as one update. Media is
    /// uploaded before the auction changes; removed files are deleted
    /// only after the change is committed.
    pub fn edit_auction(&self, edit: AuctionEdit) -> Result<Auction, Errors> {
        let AuctionEdit { at, auction_id, editor, expected_version, patch, mut media } = edit;

        let current = self.read(|repository| repository.auction(&auction_id).cloned())??;
        current.ensure_editable_by(&editor)?;
        current.ensure_version(expected_version)?;
        current.apply_patch(&patch, at)?;

        let mut plans = Vec::new();
        for kind in KINDS {
            if let Some(submission) = media.take(kind) {
                plans.push((plan_merge(kind, current.media(kind), &submission)?, submission));
            }
        }
        let removed: Vec<MediaItem> = plans.iter().flat_map(|(plan, _)| plan.removed.clone()).collect();
        let before: Vec<MediaItem> = KINDS.iter().flat_map(|kind| current.media(*kind).to_vec()).collect();

        let finished = self.upload_all(plans)?;
        let keys = Self::new_keys(&finished, &before);

        let mut command_media: [Option<Vec<MediaItem>>; 3] = [None, None, None];
        for (kind, items) in finished {
            let slot = KINDS.iter().position(|k| *k == kind).unwrap_or(0);
            command_media[slot] = Some(items);
        }
        let [photos, documents, service_records] = command_media;
        let command = Command::EditAuction {
            at,
            auction_id,
            editor,
            // Pin the version the media plan was made against.
            expected_version: Some(current.version),
            patch,
            photos,
            documents,
            service_records,
        };
        match self.execute(command) {
            Ok(CommandSuccess::AuctionUpdated { auction }) => {
                let removed_keys: Vec<String> = removed.into_iter().map(|item| item.storage_key).collect();
                self.discard(&removed_keys);
                Ok(auction)
            }
            Ok(_) => Err(Errors::Internal("unexpected outcome of EditAuction".to_string())),
            Err(e) => {
                self.discard(&keys);
                Err(e)
            }
        }
    }

    /// Moves time forward for auctions and offers. Returns how many of
    /// each changed.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<(usize, usize), Errors> {
        let auctions = match self.execute(Command::AdvanceAuctions { at: now })? {
            CommandSuccess::AuctionsAdvanced { auctions } => auctions.len(),
            _ => 0,
        };
        let offers = match self.execute(Command::ExpireOffers { at: now })? {
            CommandSuccess::OffersExpired { offers } => offers.len(),
            _ => 0,
        };
        Ok((auctions, offers))
    }
}

fn command_name(success: &CommandSuccess) -> &'static str {
    match success {
        CommandSuccess::AuctionAdded { .. } => "AuctionAdded",
        CommandSuccess::AuctionUpdated { .. } => "AuctionUpdated",
        CommandSuccess::BidAccepted { .. } => "BidAccepted",
        CommandSuccess::AuctionSold { .. } => "AuctionSold",
        CommandSuccess::AuctionCancelled { .. } => "AuctionCancelled",
        CommandSuccess::AuctionsAdvanced { .. } => "AuctionsAdvanced",
        CommandSuccess::OfferMade { .. } => "OfferMade",
        CommandSuccess::OfferUpdated { .. } => "OfferUpdated",
        CommandSuccess::OffersExpired { .. } => "OffersExpired",
        CommandSuccess::CommentAdded { .. } => "CommentAdded",
        CommandSuccess::CommentUpdated { .. } => "CommentUpdated",
        CommandSuccess::ContactQuerySubmitted { .. } => "ContactQuerySubmitted",
        CommandSuccess::ContactQueryUpdated { .. } => "ContactQueryUpdated",
        CommandSuccess::ContactQueryDeleted { .. } => "ContactQueryDeleted",
        CommandSuccess::CommissionUpdated { .. } => "CommissionUpdated",
    }
}
