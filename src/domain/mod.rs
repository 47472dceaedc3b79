pub mod account;
pub mod study;
pub mod tag;
pub mod zone;

pub use account::{Account, Notifications};
pub use study::Study;
pub use tag::Tag;
pub use zone::{parse_zone_name, Zone};
