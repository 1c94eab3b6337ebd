use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::{
    AuthProvider, BunnyClient, GoTrueClient, ObjectStorage, PostgrestClient, RestClient,
    StorageClient, VideoHost,
};
use crate::config::Config;
use crate::services::{
    ActivityRecorder, AdminService, AuthoringService, CatalogService, EngagementService,
    SessionService, SupabaseAdminService, SupabaseAuthoringService, SupabaseCatalogService,
    SupabaseEngagementService, SupabaseSessionService,
};

/// Build a shared HTTP client with reasonable defaults for backend calls.
/// Every client below reuses it so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Cinedex/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// The external systems the services talk to.
#[derive(Clone)]
pub struct Backends {
    pub rest: Arc<dyn RestClient>,
    pub storage: Arc<dyn ObjectStorage>,
    pub auth: Arc<dyn AuthProvider>,
    /// `None` when videos are kept in object storage.
    pub video_host: Option<Arc<dyn VideoHost>>,
}

impl Backends {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client =
            build_shared_http_client(config.supabase.request_timeout_seconds.into())?;
        let supabase = &config.supabase;

        let rest = Arc::new(PostgrestClient::with_shared_client(
            http_client.clone(),
            &supabase.url,
            supabase.api_key(),
        ));
        let storage = Arc::new(StorageClient::with_shared_client(
            http_client.clone(),
            &supabase.url,
            supabase.api_key(),
            &supabase.storage_bucket,
        ));
        let auth = Arc::new(GoTrueClient::with_shared_client(
            http_client.clone(),
            &supabase.url,
            &supabase.anon_key,
        ));

        let video_host = if config.bunny.enabled {
            Some(Arc::new(BunnyClient::with_shared_client(http_client, &config.bunny))
                as Arc<dyn VideoHost>)
        } else {
            None
        };

        Ok(Self {
            rest,
            storage,
            auth,
            video_host,
        })
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub catalog: Arc<dyn CatalogService>,

    pub engagement: Arc<dyn EngagementService>,

    pub session: Arc<dyn SessionService>,

    pub admin: Arc<dyn AdminService>,

    pub authoring: Arc<dyn AuthoringService>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::with_backends(config, backends))
    }

    /// Wires every service on top of `backends`.
    #[must_use]
    pub fn with_backends(config: Config, backends: Backends) -> Self {
        let Backends {
            rest,
            storage,
            auth,
            video_host,
        } = backends;

        let library_id = if config.bunny.enabled {
            config.bunny.library_id.as_str()
        } else {
            ""
        };
        let catalog = Arc::new(SupabaseCatalogService::new(
            rest.clone(),
            &config.bunny.embed_base,
            library_id,
        )) as Arc<dyn CatalogService>;

        let activity = ActivityRecorder::new(rest.clone());
        let engagement = Arc::new(SupabaseEngagementService::new(rest.clone(), activity))
            as Arc<dyn EngagementService>;

        let session =
            Arc::new(SupabaseSessionService::new(auth, rest.clone())) as Arc<dyn SessionService>;

        let admin = Arc::new(SupabaseAdminService::new(rest.clone())) as Arc<dyn AdminService>;

        let authoring = Arc::new(SupabaseAuthoringService::new(rest, storage, video_host))
            as Arc<dyn AuthoringService>;

        Self {
            config: Arc::new(RwLock::new(config)),
            catalog,
            engagement,
            session,
            admin,
            authoring,
        }
    }
}
