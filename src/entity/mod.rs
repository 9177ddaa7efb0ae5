mod category;
mod collection;
mod settings;
mod space;

pub use category::Category;
pub use collection::{CollectionGroup, CollectionUpdate, ItemUpdate, TabItem};
pub use settings::{LastSelected, UserSettings};
pub use space::{Space, SpaceUpdate};
