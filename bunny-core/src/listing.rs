use serde_json::{Map, Value};

/// Fields that may carry an entry's name, tried in order.
pub const NAME_FIELDS: &[&str] = &["ObjectName", "Name", "Key"];

/// Fields that may mark an entry as a directory, tried in order. The first
/// one present on a record decides; a record with none of them is a file.
pub const DIRECTORY_SIGNALS: &[DirectorySignal] = &[
    DirectorySignal::Flag("IsDirectory"),
    DirectorySignal::Flag("isDirectory"),
    DirectorySignal::TypeCode {
        field: "Type",
        directory: 1,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorySignal {
    /// Boolean field, `true` means directory.
    Flag(&'static str),
    /// Numeric field, equal to `directory` means directory.
    TypeCode { field: &'static str, directory: i64 },
}

impl DirectorySignal {
    fn read(&self, record: &Map<String, Value>) -> Option<bool> {
        match *self {
            DirectorySignal::Flag(field) => record.get(field)?.as_bool(),
            DirectorySignal::TypeCode { field, directory } => record
                .get(field)?
                .as_i64()
                .map(|code| code == directory),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }

    /// Normalizes one raw listing record. Returns `None` when no name field
    /// is present.
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        let name = NAME_FIELDS
            .iter()
            .filter_map(|field| record.get(*field)?.as_str())
            .map(|name| name.trim_matches('/'))
            .find(|name| !name.is_empty())?;
        let is_directory = DIRECTORY_SIGNALS
            .iter()
            .find_map(|signal| signal.read(record))
            .unwrap_or(false);
        Some(Self {
            name: name.to_string(),
            is_directory,
        })
    }
}

/// Maps a list response body to entries. Anything but a JSON array is
/// treated as an empty listing.
pub fn parse_listing(body: &Value) -> Vec<RemoteEntry> {
    let Some(records) = body.as_array() else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|record| match record.as_object() {
            Some(record) => RemoteEntry::from_record(record),
            None => None,
        })
        .collect()
}
