use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    Directory,
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode::File(FileMode::Regular)
    }
}

impl EntryMode {
    /// Octal mode string as written into tree entries
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl FileMode {
    pub fn as_u32(&self) -> u32 {
        EntryMode::File(*self).as_u32()
    }
}

impl TryFrom<u32> for FileMode {
    type Error = Error;

    fn try_from(mode: u32) -> Result<Self> {
        match mode {
            0o100644 => Ok(FileMode::Regular),
            0o100755 => Ok(FileMode::Executable),
            _ => Err(Error::IndexCorrupt(format!("invalid file mode {mode:o}"))),
        }
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "100644" => Ok(EntryMode::File(FileMode::Regular)),
            "100755" => Ok(EntryMode::File(FileMode::Executable)),
            "40000" => Ok(EntryMode::Directory),
            _ => Err(Error::corrupt(format!("invalid entry mode {value:?}"))),
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
