use super::MetaData;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageLoadError {
    #[error("Failed to read messages file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse messages: {0}")]
    Parse(String),
}

/// Kind of media attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Photo,
    Document,
    Voice,
    VideoNote,
    Animation,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Photo => "photo",
            MediaKind::Document => "document",
            MediaKind::Voice => "voice",
            MediaKind::VideoNote => "video_note",
            MediaKind::Animation => "animation",
        }
    }

    /// Whether media of this kind carries a running time
    pub fn is_time_based(self) -> bool {
        matches!(
            self,
            MediaKind::Video
                | MediaKind::Audio
                | MediaKind::Voice
                | MediaKind::VideoNote
                | MediaKind::Animation
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Sender {
    /// Username when present, otherwise the joined first and last name
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref()
            && !username.is_empty()
        {
            return username.to_string();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A message as handed over by the messaging client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub from_user: Option<Sender>,
    #[serde(default)]
    pub reply_to_message_id: Option<i64>,
}

impl MetaData {
    pub fn from_message(message: &Message) -> Self {
        let mut meta = MetaData {
            message_id: message.id,
            message_date: message.date,
            message_caption: message.caption.clone().unwrap_or_default(),
            reply_to_message_id: message.reply_to_message_id.unwrap_or(0),
            ..MetaData::default()
        };

        if let Some(sender) = &message.from_user {
            meta.sender_id = sender.id;
            meta.sender_name = sender.display_name();
        }

        if let Some(media) = &message.media {
            meta.media_type = media.kind.as_str().to_string();
            meta.media_file_size = media.file_size;
            meta.media_width = media.width;
            meta.media_height = media.height;
            meta.media_file_name = media.file_name.clone().unwrap_or_default();
            meta.media_duration = if media.kind.is_time_based() {
                media.duration
            } else {
                None
            };
            meta.file_extension = file_extension(media);
        }

        meta
    }
}

impl From<&Message> for MetaData {
    fn from(message: &Message) -> Self {
        MetaData::from_message(message)
    }
}

fn file_extension(media: &Media) -> String {
    if let Some(ext) = media
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
    {
        return ext.to_string();
    }

    if let Some(subtype) = media
        .mime_type
        .as_deref()
        .and_then(|mime| mime.split_once('/'))
        .map(|(_, subtype)| subtype)
    {
        return match subtype {
            "jpeg" => "jpg",
            "mpeg" => "mp3",
            "quicktime" => "mov",
            "x-matroska" => "mkv",
            other => other,
        }
        .to_string();
    }

    if media.kind == MediaKind::Photo {
        "jpg".to_string()
    } else {
        String::new()
    }
}

/// Parse a JSON (or JSON5) array of messages
pub fn parse_messages(raw: &str) -> Result<Vec<Message>, MessageLoadError> {
    json5::from_str::<Vec<Message>>(raw).map_err(|e| MessageLoadError::Parse(e.to_string()))
}

pub fn load_messages(path: impl AsRef<Path>) -> Result<Vec<Message>, MessageLoadError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| MessageLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_messages(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 8, 5)
            .and_then(|d| d.and_hms_opt(14, 35, 12))
            .unwrap()
    }

    fn video() -> Media {
        Media {
            kind: MediaKind::Video,
            file_name: Some("test.mp4".to_string()),
            mime_type: Some("video/mp4".to_string()),
            file_size: 1024 * 1024 * 10,
            width: 1920,
            height: 1080,
            duration: Some(35),
        }
    }

    #[test]
    fn test_video_message_binding() {
        let message = Message {
            id: 5,
            date: date(),
            caption: None,
            media: Some(video()),
            from_user: Some(Sender {
                id: 123,
                username: Some("coco".to_string()),
                ..Sender::default()
            }),
            reply_to_message_id: None,
        };

        let meta = MetaData::from_message(&message);
        assert_eq!(meta.message_id, 5);
        assert_eq!(meta.message_date, date());
        assert_eq!(meta.message_caption, "");
        assert_eq!(meta.media_file_size, 1024 * 1024 * 10);
        assert_eq!(meta.media_width, 1920);
        assert_eq!(meta.media_height, 1080);
        assert_eq!(meta.media_file_name, "test.mp4");
        assert_eq!(meta.media_duration, Some(35));
        assert_eq!(meta.media_type, "video");
        assert_eq!(meta.file_extension, "mp4");
        assert_eq!(meta.sender_name, "coco");
        assert_eq!(meta.sender_id, 123);
        assert_eq!(meta.reply_to_message_id, 0);
    }

    #[test]
    fn test_photo_has_no_duration() {
        let message = Message {
            id: 5,
            date: date(),
            caption: Some("#tag".to_string()),
            media: Some(Media {
                kind: MediaKind::Photo,
                file_name: None,
                mime_type: None,
                file_size: 2048,
                width: 0,
                height: 0,
                duration: Some(3),
            }),
            from_user: None,
            reply_to_message_id: Some(4),
        };

        let meta = MetaData::from_message(&message);
        assert_eq!(meta.media_duration, None);
        assert_eq!(meta.media_type, "photo");
        assert_eq!(meta.file_extension, "jpg");
        assert_eq!(meta.message_caption, "#tag");
        assert_eq!(meta.reply_to_message_id, 4);
    }

    #[test]
    fn test_extension_falls_back_to_mime_subtype() {
        let mut media = video();
        media.file_name = None;
        media.mime_type = Some("video/quicktime".to_string());
        assert_eq!(file_extension(&media), "mov");

        media.mime_type = Some("audio/mpeg".to_string());
        assert_eq!(file_extension(&media), "mp3");
    }

    #[test]
    fn test_sender_name_falls_back_to_full_name() {
        let sender = Sender {
            id: 1,
            username: None,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
        };
        assert_eq!(sender.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_parse_messages_accepts_json5() {
        let raw = r#"[
            // trailing commas and comments are fine
            { id: 7, date: "2022-08-05T14:35:12", media: { kind: "video_note", duration: 9 }, },
        ]"#;
        let messages = parse_messages(raw).expect("valid messages");
        assert_eq!(messages.len(), 1);
        let meta = MetaData::from(&messages[0]);
        assert_eq!(meta.media_type, "video_note");
        assert_eq!(meta.media_duration, Some(9));
    }
}
