//! Admin media form: submitted values, uploaded files and their validation.
//!
//! Validation collects every field error before anything touches the
//! backend, so a rejected form never leaves partial rows behind.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use axum::body::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::limits::MIN_YEAR;
use crate::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::domain::filters::current_year;
use crate::domain::{GenreId, MediaType};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub character: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorInput {
    #[serde(default)]
    pub name: String,
}

/// Text fields of the form, as submitted in the `payload` part.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFormValues {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(rename = "type", alias = "media_type", default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub genres: Vec<GenreId>,
    #[serde(default)]
    pub actors: Vec<ActorInput>,
    #[serde(default)]
    pub directors: Vec<DirectorInput>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Browsers send an empty part for an untouched file input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Declared content type, or one guessed from the file name.
    #[must_use]
    pub fn mime_type(&self) -> String {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map_or_else(
                || {
                    mime_guess::from_path(&self.file_name)
                        .first_or_octet_stream()
                        .to_string()
                },
                str::to_string,
            )
    }

    fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    fn looks_like(&self, mime_prefix: &str, extensions: &[&str]) -> bool {
        self.mime_type().starts_with(mime_prefix)
            || self
                .extension()
                .is_some_and(|ext| extensions.contains(&ext.as_str()))
    }
}

/// Files attached to the form. Photos are keyed by the index of the cast row
/// they belong to.
#[derive(Debug, Clone, Default)]
pub struct MediaFiles {
    pub poster: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
    pub actor_photos: BTreeMap<usize, UploadedFile>,
    pub director_photos: BTreeMap<usize, UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Cast or crew member that survived validation.
#[derive(Debug, Clone)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub photo: Option<UploadedFile>,
}

/// A validated form, ready to be written.
#[derive(Debug, Clone)]
pub struct MediaDraft {
    pub title: String,
    pub original_title: Option<String>,
    pub media_type: MediaType,
    pub description: String,
    pub year: i32,
    pub duration: i32,
    pub genres: Vec<GenreId>,
    pub poster: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
    pub actors: Vec<CastMember>,
    pub directors: Vec<CastMember>,
}

/// Checks the submitted form and pairs cast rows with their photos.
///
/// Rows with a blank name are dropped. Poster and video are mandatory only
/// when creating.
pub fn validate(
    values: MediaFormValues,
    mut files: MediaFiles,
    mode: FormMode,
) -> Result<MediaDraft, ValidationErrors> {
    let mut errors = Vec::new();

    let title = values.title.trim().to_string();
    if title.is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }

    let description = values.description.trim().to_string();
    if description.is_empty() {
        errors.push(FieldError::new("description", "Description is required"));
    }

    let max_year = current_year();
    let year = match values.year {
        Some(y) if (MIN_YEAR..=max_year).contains(&y) => y,
        Some(y) => {
            errors.push(FieldError::new(
                "year",
                format!("Year must be between {MIN_YEAR} and {max_year}, got {y}"),
            ));
            y
        }
        None => {
            errors.push(FieldError::new("year", "Year is required"));
            0
        }
    };

    let duration = match values.duration {
        Some(d) if d >= 1 => d,
        _ => {
            errors.push(FieldError::new("duration", "Duration is required"));
            0
        }
    };

    let genres: Vec<GenreId> = values
        .genres
        .into_iter()
        .filter(|g| !g.is_empty())
        .collect();
    if genres.is_empty() {
        errors.push(FieldError::new("genres", "Select at least one genre"));
    }

    let poster = files.poster.take().filter(|f| !f.is_empty());
    let video = files.video.take().filter(|f| !f.is_empty());

    match &poster {
        None if mode == FormMode::Create => {
            errors.push(FieldError::new("poster", "Poster is required"));
        }
        Some(file) if !file.looks_like("image/", IMAGE_EXTENSIONS) => {
            errors.push(FieldError::new("poster", "Poster must be an image"));
        }
        _ => {}
    }

    match &video {
        None if mode == FormMode::Create => {
            errors.push(FieldError::new("video", "Video is required"));
        }
        Some(file) if !file.looks_like("video/", VIDEO_EXTENSIONS) => {
            errors.push(FieldError::new("video", "Video must be a video file"));
        }
        _ => {}
    }

    let actors = values
        .actors
        .into_iter()
        .enumerate()
        .filter(|(_, a)| !a.name.trim().is_empty())
        .map(|(i, a)| CastMember {
            name: a.name.trim().to_string(),
            character: Some(a.character.trim().to_string()).filter(|c| !c.is_empty()),
            photo: files.actor_photos.remove(&i).filter(|f| !f.is_empty()),
        })
        .collect::<Vec<_>>();

    let directors = values
        .directors
        .into_iter()
        .enumerate()
        .filter(|(_, d)| !d.name.trim().is_empty())
        .map(|(i, d)| CastMember {
            name: d.name.trim().to_string(),
            character: None,
            photo: files.director_photos.remove(&i).filter(|f| !f.is_empty()),
        })
        .collect::<Vec<_>>();

    for (field, member) in actors
        .iter()
        .map(|m| ("actor_photo", m))
        .chain(directors.iter().map(|m| ("director_photo", m)))
    {
        let Some(photo) = &member.photo else {
            continue;
        };
        if !photo.looks_like("image/", IMAGE_EXTENSIONS) {
            errors.push(FieldError::new(
                field,
                format!("Photo of {} must be an image", member.name),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(MediaDraft {
        title,
        original_title: values
            .original_title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        media_type: values.media_type,
        description,
        year,
        duration,
        genres,
        poster,
        video,
        actors,
        directors,
    })
}

/// Makes an uploaded file name safe to use as an object key.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("Invalid regex"));

    let clean = |part: &str| {
        re.replace_all(part, "_")
            .trim_matches(['.', '_'])
            .to_string()
    };

    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, clean(ext).to_ascii_lowercase()),
        _ => (base, String::new()),
    };

    let stem = clean(stem);
    let stem = if stem.is_empty() { "file" } else { &stem };

    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

/// Object key `<prefix>/<millis>-<name>`.
#[must_use]
pub fn object_path(prefix: &str, millis: i64, file_name: &str) -> String {
    format!("{prefix}/{millis}-{}", sanitize_file_name(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: None,
            bytes: Bytes::from_static(&[1, 2, 3]),
        }
    }

    fn values() -> MediaFormValues {
        MediaFormValues {
            title: "Stalker".to_string(),
            original_title: Some("Сталкер".to_string()),
            media_type: MediaType::Movie,
            description: "Three men enter the Zone.".to_string(),
            year: Some(1979),
            duration: Some(161),
            genres: vec![GenreId::new("1")],
            actors: vec![ActorInput {
                name: "Alexander Kaidanovsky".to_string(),
                character: "Stalker".to_string(),
            }],
            directors: vec![DirectorInput {
                name: "Andrei Tarkovsky".to_string(),
            }],
        }
    }

    fn files() -> MediaFiles {
        MediaFiles {
            poster: Some(file("poster.jpg")),
            video: Some(file("film.mp4")),
            ..MediaFiles::default()
        }
    }

    #[test]
    fn valid_form_passes() {
        let draft = validate(values(), files(), FormMode::Create).unwrap();
        assert_eq!(draft.title, "Stalker");
        assert_eq!(draft.actors.len(), 1);
        assert_eq!(draft.actors[0].character.as_deref(), Some("Stalker"));
        assert_eq!(draft.directors[0].character, None);
    }

    #[test]
    fn validation_hands_over_the_uploaded_buffer() {
        let video = Bytes::from(vec![0_u8; 4096]);
        let mut f = files();
        f.video = Some(UploadedFile {
            file_name: "film.mp4".to_string(),
            content_type: Some("video/mp4".to_string()),
            bytes: video.clone(),
        });
        let draft = validate(values(), f, FormMode::Create).unwrap();
        let stored = draft.video.unwrap().bytes;
        assert_eq!(stored.as_ptr(), video.as_ptr());
        assert_eq!(stored.len(), 4096);
    }

    #[test]
    fn missing_poster_is_reported_by_name() {
        let mut f = files();
        f.poster = None;
        let errors = validate(values(), f, FormMode::Create).unwrap_err();
        assert!(errors.has_field("poster"));
        assert!(!errors.has_field("video"));
    }

    #[test]
    fn empty_file_part_counts_as_missing() {
        let mut f = files();
        f.video = Some(UploadedFile {
            file_name: String::new(),
            content_type: Some("application/octet-stream".to_string()),
            bytes: Bytes::new(),
        });
        let errors = validate(values(), f, FormMode::Create).unwrap_err();
        assert!(errors.has_field("video"));
    }

    #[test]
    fn files_are_optional_on_edit() {
        let draft = validate(values(), MediaFiles::default(), FormMode::Edit).unwrap();
        assert!(draft.poster.is_none());
        assert!(draft.video.is_none());
    }

    #[test]
    fn errors_are_collected_together() {
        let form = MediaFormValues {
            title: "  ".to_string(),
            description: String::new(),
            year: Some(1850),
            duration: Some(0),
            genres: Vec::new(),
            ..values()
        };
        let errors = validate(form, MediaFiles::default(), FormMode::Create).unwrap_err();

        for field in ["title", "description", "year", "duration", "genres", "poster", "video"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn blank_cast_rows_are_dropped_and_photos_follow_their_row() {
        let form = MediaFormValues {
            actors: vec![
                ActorInput {
                    name: " ".to_string(),
                    character: "Nobody".to_string(),
                },
                ActorInput {
                    name: "Anatoly Solonitsyn".to_string(),
                    character: String::new(),
                },
            ],
            ..values()
        };
        let mut f = files();
        f.actor_photos.insert(1, file("solonitsyn.png"));

        let draft = validate(form, f, FormMode::Create).unwrap();
        assert_eq!(draft.actors.len(), 1);
        assert_eq!(draft.actors[0].name, "Anatoly Solonitsyn");
        assert_eq!(draft.actors[0].character, None);
        assert_eq!(
            draft.actors[0].photo.as_ref().map(|p| p.file_name.as_str()),
            Some("solonitsyn.png")
        );
    }

    #[test]
    fn poster_must_be_an_image() {
        let mut f = files();
        f.poster = Some(file("notes.txt"));
        let errors = validate(values(), f, FormMode::Create).unwrap_err();
        assert!(errors.has_field("poster"));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("My Poster (final).JPG"), "My_Poster_final.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(object_path("posters", 1_700_000_000_000, "a b.png"), "posters/1700000000000-a_b.png");
    }

    #[test]
    fn non_ascii_names_keep_their_extension() {
        assert_eq!(sanitize_file_name("Сталкер.mp4"), "file.mp4");
        assert_eq!(sanitize_file_name("Амели Пулен.WEBP"), "file.webp");
        assert_eq!(sanitize_file_name("Solaris 1972.mkv"), "Solaris_1972.mkv");
        assert_eq!(
            object_path("videos", 1_700_000_000_000, "Сталкер.mp4"),
            "videos/1700000000000-file.mp4"
        );
    }

    #[test]
    fn mime_type_is_guessed_from_name() {
        assert_eq!(file("poster.png").mime_type(), "image/png");
        let declared = UploadedFile {
            content_type: Some("image/webp".to_string()),
            ..file("blob")
        };
        assert_eq!(declared.mime_type(), "image/webp");
    }
}
