pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "webm", "mov", "wmv", "flv", "m4v"];

pub mod tables {

    pub const MEDIA_ITEMS: &str = "media_items";

    pub const GENRES: &str = "genres";

    pub const MEDIA_GENRES: &str = "media_genres";

    pub const PERSONS: &str = "persons";

    pub const MEDIA_PERSONS: &str = "media_persons";

    pub const RATINGS: &str = "ratings";

    pub const COMMENTS: &str = "comments";

    pub const PROFILES: &str = "profiles";

    pub const USER_MEDIA_STATUSES: &str = "user_media_statuses";

    pub const USER_ACTIVITIES: &str = "user_activities";
}

pub mod storage {

    pub const POSTERS_PREFIX: &str = "posters";

    pub const VIDEOS_PREFIX: &str = "videos";

    pub const PERSONS_PREFIX: &str = "persons";
}

pub mod bunny {

    pub const API_BASE: &str = "https://video.bunnycdn.com";

    pub const EMBED_BASE: &str = "https://iframe.mediadelivery.net/embed";
}

pub mod limits {

    pub const MIN_YEAR: i32 = 1900;

    pub const MAX_RATING: f64 = 5.0;

    pub const RATING_STEP: f64 = 0.5;

    pub const MAX_COMMENT_LENGTH: usize = 2000;

    pub const MAX_SEARCH_TERMS: usize = 8;

    pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;
}
