pub mod activity;
pub use activity::ActivityRecorder;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogService};
pub use catalog_service_impl::SupabaseCatalogService;

pub mod engagement_service;
pub mod engagement_service_impl;
pub use engagement_service::{EngagementError, EngagementService};
pub use engagement_service_impl::SupabaseEngagementService;

pub mod session_service;
pub mod session_service_impl;
pub use session_service::{CurrentUser, SessionError, SessionService};
pub use session_service_impl::SupabaseSessionService;

pub mod admin_service;
pub mod admin_service_impl;
pub use admin_service::{AdminError, AdminService};
pub use admin_service_impl::SupabaseAdminService;

pub mod media_form;
pub use media_form::{FieldError, FormMode, MediaFiles, MediaFormValues, UploadedFile, ValidationErrors};

pub mod authoring_service;
pub mod authoring_service_impl;
pub use authoring_service::{AuthoringError, AuthoringService, AuthoringStage};
pub use authoring_service_impl::SupabaseAuthoringService;
