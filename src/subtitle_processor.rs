use std::fmt;
use std::path::Path;
use std::str::FromStr;
use regex::Regex;
use once_cell::sync::Lazy;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

// @module: Subtitle parsing and serialization (SRT and WebVTT)

// @const: SRT cue pattern, timing line followed by the first text line
static SRT_CUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{1,2}:[0-9]{1,2}:[0-9]{1,2},[0-9]{3}) --> ([0-9]{1,2}:[0-9]{1,2}:[0-9]{1,2},[0-9]{3})\n([^\n]+)")
        .expect("SRT cue pattern is valid")
});

// @const: VTT cue pattern, cue settings after the end time are skipped
static VTT_CUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9:.]+) --> ([0-9:.]+)(?:[ \t][^\n]*)?\n([^\n]+)")
        .expect("VTT cue pattern is valid")
});

const VTT_HEADER: &str = "WEBVTT";

/// Subtitle file format, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// Detect the format from a file name such as `movie.en.vtt`
    pub fn from_file_name(file_name: &str) -> Result<Self, SubtitleError> {
        let extension = Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .ok_or_else(|| SubtitleError::UnsupportedFormat(file_name.to_string()))?;

        extension
            .parse()
            .map_err(|_| SubtitleError::UnsupportedFormat(file_name.to_string()))
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }

    fn cue_regex(&self) -> &'static Regex {
        match self {
            Self::Srt => &SRT_CUE_REGEX,
            Self::Vtt => &VTT_CUE_REGEX,
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            _ => Err(SubtitleError::UnsupportedFormat(s.to_string())),
        }
    }
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    // @field: Start timestamp, verbatim from the source file
    pub start_time: String,

    // @field: End timestamp, verbatim from the source file
    pub end_time: String,

    // @field: First text line of the cue
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>, text: impl Into<String>) -> Self {
        SubtitleEntry {
            start_time: start_time.into(),
            end_time: end_time.into(),
            text: text.into(),
        }
    }

    /// Copy of this cue with the text replaced and the timing untouched
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        SubtitleEntry {
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            text: text.into(),
        }
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} --> {}", self.start_time, self.end_time)?;
        writeln!(f, "{}", self.text)
    }
}

/// Collection of subtitle cues read from one file
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCollection {
    /// Original file name
    pub file_name: String,

    /// Format detected from the file name
    pub format: SubtitleFormat,

    /// Cues in file order
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Parse a subtitle file's content, detecting the format from its name
    pub fn from_content(file_name: impl Into<String>, content: &str) -> Result<Self, SubtitleError> {
        let file_name = file_name.into();
        let format = SubtitleFormat::from_file_name(&file_name)?;
        let entries = Self::parse_entries(content, format);

        Ok(SubtitleCollection {
            file_name,
            format,
            entries,
        })
    }

    /// Scan `content` for cues in the given format.
    ///
    /// The grammar is permissive: anything that is not a timing line directly
    /// followed by a text line (sequence numbers, blank lines, cue identifiers,
    /// extra text lines, the `WEBVTT` header) is skipped. Input with no
    /// recognizable cue yields an empty vector.
    pub fn parse_entries(content: &str, format: SubtitleFormat) -> Vec<SubtitleEntry> {
        let normalized;
        let content = if content.contains('\r') {
            normalized = content.replace("\r\n", "\n");
            normalized.as_str()
        } else {
            content
        };

        let entries: Vec<SubtitleEntry> = format
            .cue_regex()
            .captures_iter(content)
            .map(|caps| SubtitleEntry::new(&caps[1], &caps[2], &caps[3]))
            .collect();

        debug!("Parsed {} {} cues", entries.len(), format);
        entries
    }

    /// Render cues back into file content. Sequence numbers are not emitted.
    pub fn serialize_entries(entries: &[SubtitleEntry], format: SubtitleFormat) -> String {
        let body = entries
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join("\n");

        match format {
            SubtitleFormat::Srt => body,
            SubtitleFormat::Vtt => format!("{}\n\n{}", VTT_HEADER, body),
        }
    }

    /// Render this collection in its own format
    pub fn serialize(&self) -> String {
        Self::serialize_entries(&self.entries, self.format)
    }

    /// Copy of this collection carrying different cues
    pub fn with_entries(&self, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            file_name: self.file_name.clone(),
            format: self.format,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
