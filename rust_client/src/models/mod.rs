pub mod node;
pub mod preferences;
pub mod settings;
pub mod task;
pub mod user;

pub use node::*;
pub use preferences::{PreferenceEdit, Preferences, ReservedSlot};
pub use settings::{SettingEdit, Settings, SettingsPatch};
pub use task::*;
pub use user::*;
