pub mod error;
pub mod post;
pub mod profile;
pub mod status;

pub use error::{PostsError, Result};
pub use post::Post;
pub use profile::{BannerMode, MappingLayers, StorageProfile};
pub use status::PostStatus;
