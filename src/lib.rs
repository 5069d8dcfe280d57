pub use forge_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use forge_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use forge_client::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use forge_fs::*;
}

pub mod prelude {
    pub use forge_core::prelude::*;

    #[cfg(feature = "server")]
    pub use forge_server::prelude::*;

    #[cfg(feature = "client")]
    pub use forge_client::{HttpStore, StoreConfig, UploadError, UploadReport, Uploader};

    #[cfg(feature = "fs")]
    pub use forge_fs::FileSystemStorage;
}
