pub mod app_settings;
pub mod event;
pub mod persistence;

pub use app_settings::AppSettings;
pub use event::{Event, EventData};
pub use persistence::Persistable;
