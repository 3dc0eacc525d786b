use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

mod message;

pub use message::{
    Media, MediaKind, Message, MessageLoadError, Sender, load_messages, parse_messages,
};

/// Datetime rendering used in diagnostics and text output
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-message facts that filter identifiers resolve against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaData {
    pub message_id: i64,
    pub message_date: NaiveDateTime,
    pub message_caption: String,
    pub media_file_size: i64,
    pub media_width: i64,
    pub media_height: i64,
    pub media_file_name: String,
    /// Unset for media without a running time (photos, documents)
    pub media_duration: Option<i64>,
    pub media_type: String,
    pub file_extension: String,
    pub sender_name: String,
    pub sender_id: i64,
    pub reply_to_message_id: i64,
}

/// Value type of a field or literal as seen by the type checker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Datetime,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Datetime => "datetime",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value borrowed from a bound [`MetaData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    /// `None` when a nullable field is unset
    Int(Option<i64>),
    Datetime(NaiveDateTime),
}

/// The closed set of identifiers a filter expression may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    MessageDate,
    Caption,
    FileSize,
    Width,
    Height,
    FileName,
    Duration,
    MediaType,
    FileExtension,
    SenderName,
    SenderId,
    ReplyToMessageId,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Id,
        Field::MessageDate,
        Field::Caption,
        Field::FileSize,
        Field::Width,
        Field::Height,
        Field::FileName,
        Field::Duration,
        Field::MediaType,
        Field::FileExtension,
        Field::SenderName,
        Field::SenderId,
        Field::ReplyToMessageId,
    ];

    /// Resolve an identifier, including its aliases
    pub fn from_name(name: &str) -> Option<Field> {
        let field = match name {
            "id" => Field::Id,
            "message_date" => Field::MessageDate,
            "message_caption" | "caption" => Field::Caption,
            "media_file_size" | "file_size" => Field::FileSize,
            "media_width" => Field::Width,
            "media_height" => Field::Height,
            "media_file_name" => Field::FileName,
            "media_duration" => Field::Duration,
            "media_type" => Field::MediaType,
            "file_extension" => Field::FileExtension,
            "sender_name" => Field::SenderName,
            "sender_id" => Field::SenderId,
            "reply_to_message_id" => Field::ReplyToMessageId,
            _ => return None,
        };
        Some(field)
    }

    /// Canonical identifier
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::MessageDate => "message_date",
            Field::Caption => "message_caption",
            Field::FileSize => "media_file_size",
            Field::Width => "media_width",
            Field::Height => "media_height",
            Field::FileName => "media_file_name",
            Field::Duration => "media_duration",
            Field::MediaType => "media_type",
            Field::FileExtension => "file_extension",
            Field::SenderName => "sender_name",
            Field::SenderId => "sender_id",
            Field::ReplyToMessageId => "reply_to_message_id",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Caption => &["caption"],
            Field::FileSize => &["file_size"],
            _ => &[],
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Field::MessageDate => FieldType::Datetime,
            Field::Caption
            | Field::FileName
            | Field::MediaType
            | Field::FileExtension
            | Field::SenderName => FieldType::Str,
            Field::Id
            | Field::FileSize
            | Field::Width
            | Field::Height
            | Field::Duration
            | Field::SenderId
            | Field::ReplyToMessageId => FieldType::Int,
        }
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, Field::Duration)
    }
}

impl MetaData {
    pub fn get(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Id => FieldValue::Int(Some(self.message_id)),
            Field::MessageDate => FieldValue::Datetime(self.message_date),
            Field::Caption => FieldValue::Str(&self.message_caption),
            Field::FileSize => FieldValue::Int(Some(self.media_file_size)),
            Field::Width => FieldValue::Int(Some(self.media_width)),
            Field::Height => FieldValue::Int(Some(self.media_height)),
            Field::FileName => FieldValue::Str(&self.media_file_name),
            Field::Duration => FieldValue::Int(self.media_duration),
            Field::MediaType => FieldValue::Str(&self.media_type),
            Field::FileExtension => FieldValue::Str(&self.file_extension),
            Field::SenderName => FieldValue::Str(&self.sender_name),
            Field::SenderId => FieldValue::Int(Some(self.sender_id)),
            Field::ReplyToMessageId => FieldValue::Int(Some(self.reply_to_message_id)),
        }
    }
}
