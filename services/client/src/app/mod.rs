pub mod applications;
pub mod auth;
pub mod catalog;
pub mod likes;
pub mod navigation;
pub mod quiz;
pub mod session;
pub mod state;
pub mod summary;

pub use navigation::{AuthNotice, Navigation, Navigator};
pub use session::{SessionGuard, TokenStore};
pub use state::AppState;
pub use summary::{PollPolicy, SummaryError, SummaryService};
