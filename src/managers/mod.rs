pub mod account_manager;
pub mod study_manager;
pub mod zone_manager;

pub use account_manager::{
    create_shared_account_manager, EmailCheck, SharedAccountManager, TokenEmail,
};
pub use study_manager::{create_shared_study_manager, SharedStudyManager};
pub use zone_manager::init_zones;
