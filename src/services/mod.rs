pub mod notifier;
pub mod storage;

pub use self::notifier::{LogNotifier, Notification, Notifier, NotifyError};
pub use self::storage::{FileMediaStorage, InMemoryMediaStorage, MediaStorage, StorageError, StoredObject};
