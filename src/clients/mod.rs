pub mod auth;
pub mod bunny;
pub mod postgrest;
pub mod storage;

pub use auth::{AuthError, AuthProvider, AuthUser, GoTrueClient};
pub use bunny::{BunnyClient, BunnyError, VideoHost};
pub use postgrest::{PostgrestClient, PostgrestError, Query, RestClient};
pub use storage::{ObjectStorage, StorageClient, StorageError};
