//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - At most one parent commit ID (history is a single chain)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use std::io::BufRead;

pub const AUTHOR_NAME_ENV: &str = "TROVE_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "TROVE_AUTHOR_EMAIL";
pub const AUTHOR_DATE_ENV: &str = "TROVE_AUTHOR_DATE";

/// Author or committer information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current local time
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Name and email, as "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Serialized form: "Name <email> timestamp timezone"
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author information from environment variables
    ///
    /// Reads TROVE_AUTHOR_NAME, TROVE_AUTHOR_EMAIL, and optionally TROVE_AUTHOR_DATE
    /// (RFC 2822 or `%Y-%m-%d %H:%M:%S %z`). Without a date, the current time is used.
    pub fn load_from_env() -> Result<Self> {
        let name = std::env::var(AUTHOR_NAME_ENV)
            .map_err(|_| Error::Config(format!("{AUTHOR_NAME_ENV} not set")))?;
        let email = std::env::var(AUTHOR_EMAIL_ENV)
            .map_err(|_| Error::Config(format!("{AUTHOR_EMAIL_ENV} not set")))?;

        match std::env::var(AUTHOR_DATE_ENV) {
            Ok(date) => {
                let timestamp = DateTime::parse_from_rfc2822(&date)
                    .or_else(|_| DateTime::parse_from_str(&date, "%Y-%m-%d %H:%M:%S %z"))
                    .map_err(|_| Error::Config(format!("{AUTHOR_DATE_ENV} is invalid: {date}")))?;
                Ok(Author::new_with_timestamp(name, email, timestamp))
            }
            Err(_) => Ok(Author::new(name, email)),
        }
    }

    /// Timestamp in human-readable form, like "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp.format("%a %b %-d %H:%M:%S %Y %z").to_string()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(Error::corrupt(format!("invalid identity line {value:?}")));
        }

        let timezone = parts[0];
        let seconds = parts[1]
            .parse::<i64>()
            .map_err(|_| Error::corrupt(format!("invalid timestamp {:?}", parts[1])))?;
        let name_email = parts[2];

        let email_start = name_email
            .find('<')
            .ok_or_else(|| Error::corrupt("identity is missing '<'"))?;
        let email_end = name_email
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| Error::corrupt("identity is missing '>'"))?;

        let name = name_email[..email_start].trim().to_string();
        let email = name_email[email_start + 1..email_end].to_string();

        let offset = parse_timezone(timezone)
            .ok_or_else(|| Error::corrupt(format!("invalid timezone {timezone:?}")))?;
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| Error::corrupt(format!("timestamp {seconds} out of range")))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

/// Parse a `+hhmm` / `-hhmm` offset
fn parse_timezone(timezone: &str) -> Option<FixedOffset> {
    if timezone.len() != 5 || !timezone.is_ascii() {
        return None;
    }

    let (sign, digits) = timezone.split_at(1);
    let hours = digits[..2].parse::<i32>().ok()?;
    let minutes = digits[2..].parse::<i32>().ok()?;
    let seconds = hours * 3600 + minutes * 60;

    match sign {
        "+" => FixedOffset::east_opt(seconds),
        "-" => FixedOffset::west_opt(seconds),
        _ => None,
    }
}

/// Commit object
///
/// Represents a snapshot of the repository with metadata. The parent is absent
/// only for the first commit of a chain.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    parent: Option<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    /// Create a new commit; the author is also recorded as committer
    pub fn new(parent: Option<ObjectId>, tree_oid: ObjectId, author: Author, message: String) -> Self {
        Commit {
            parent,
            tree_oid,
            committer: author.clone(),
            author,
            message,
        }
    }

    /// First line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.author.timestamp()
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        if let Some(parent) = &self.parent {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));

        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let content = format!("{}\n\n{}", self.header_lines().join("\n"), self.message);
        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|_| Error::corrupt("commit is not valid UTF-8"))?;

        let (header, message) = content
            .split_once("\n\n")
            .ok_or_else(|| Error::corrupt("commit is missing the message separator"))?;
        let mut lines = header.lines();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .ok_or_else(|| Error::corrupt("commit is missing the tree line"))?;
        let tree_oid = ObjectId::try_parse(tree_oid).map_err(|e| Error::corrupt(e.to_string()))?;

        let mut next_line = lines
            .next()
            .ok_or_else(|| Error::corrupt("commit is missing the author line"))?;

        let parent = match next_line.strip_prefix("parent ") {
            Some(parent) => {
                let parent = ObjectId::try_parse(parent).map_err(|e| Error::corrupt(e.to_string()))?;
                next_line = lines
                    .next()
                    .ok_or_else(|| Error::corrupt("commit is missing the author line"))?;
                Some(parent)
            }
            None => None,
        };

        if next_line.starts_with("parent ") {
            return Err(Error::corrupt("commit has more than one parent"));
        }

        let author = next_line
            .strip_prefix("author ")
            .ok_or_else(|| Error::corrupt("commit is missing the author line"))?;
        let author = Author::try_from(author)?;

        let committer = lines
            .next()
            .and_then(|line| line.strip_prefix("committer "))
            .ok_or_else(|| Error::corrupt("commit is missing the committer line"))?;
        let committer = Author::try_from(committer)?;

        if lines.next().is_some() {
            return Err(Error::corrupt("commit has unexpected header lines"));
        }

        Ok(Commit {
            parent,
            tree_oid,
            author,
            committer,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}
