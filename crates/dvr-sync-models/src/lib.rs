pub mod dvr;
pub mod library;
pub mod media;
pub mod report;
pub mod setting;
pub mod subscription;
pub mod watchlist;

pub use dvr::{Dvr, DvrCandidate, DvrSection, MediaProvider};
pub use library::{LibraryItem, LibrarySection};
pub use media::MediaType;
pub use report::{ReconciliationResult, WatchlistReport};
pub use setting::{parse_enum_values, PrefValue, Setting, SettingType};
pub use subscription::{SubscribedItem, Subscription};
pub use watchlist::WatchlistItem;
