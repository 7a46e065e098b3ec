//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Read
//! paths take `&PgPool`; anything that participates in a transaction takes
//! a generic executor so callers can pass `&mut *tx`.

pub mod annotation_repo;
pub mod data_file_repo;
pub mod dataset_repo;
pub mod member_repo;
pub mod mission_repo;
pub mod response_repo;
pub mod user_repo;

pub use annotation_repo::FileAnnotationRepo;
pub use data_file_repo::DataFileRepo;
pub use dataset_repo::DatasetRepo;
pub use member_repo::MissionMemberRepo;
pub use mission_repo::MissionRepo;
pub use response_repo::ResponseRepo;
pub use user_repo::UserRepo;
