//! Mail addresses (`local-part@domain` with an optional display name).
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// An address of the form `local-part@domain`.
///
/// This is a much simpler check than the full RFC 5322 `addr-spec`
/// grammar, it rejects what can't be an address (no `@`, empty parts,
/// whitespace and brackets) but doesn't try to validate exotic quoted
/// local parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email {
    local_part: String,
    domain: String,
}

impl Email {
    pub fn new(email: &str) -> Result<Self, ValidationError> {
        let email = email.trim();
        let invalid = || ValidationError::InvalidAddress {
            address: email.to_owned(),
        };

        let idx = email.rfind('@').ok_or_else(invalid)?;
        let local_part = &email[..idx];
        let domain = &email[idx + 1..];

        if local_part.is_empty() || domain.is_empty() {
            return Err(invalid());
        }
        if !local_part.chars().all(is_local_part_char) {
            return Err(invalid());
        }
        if !domain.chars().all(is_domain_char)
            || domain.starts_with('.')
            || domain.ends_with('.')
            || domain.contains("..")
        {
            return Err(invalid());
        }

        Ok(Email {
            local_part: local_part.to_owned(),
            domain: domain.to_owned(),
        })
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

fn is_local_part_char(ch: char) -> bool {
    !(ch.is_whitespace() || ch.is_control() || "<>()[]\\,;:@".contains(ch))
}

fn is_domain_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '.'
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(inp: &str) -> Result<Self, Self::Err> {
        Email::new(inp)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        write!(fter, "{}@{}", self.local_part, self.domain)
    }
}

/// An `Email` with an optional display name, e.g. `Max Mustermann <max@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox {
    display_name: Option<String>,
    email: Email,
}

impl Mailbox {
    pub fn new(display_name: Option<&str>, email: &str) -> Result<Self, ValidationError> {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned);

        if let Some(name) = display_name.as_ref() {
            if name.contains(|ch: char| ch == '\r' || ch == '\n') {
                return Err(ValidationError::InvalidAddress {
                    address: format!("{} <{}>", name, email),
                });
            }
        }

        Ok(Mailbox {
            display_name,
            email: Email::new(email)?,
        })
    }

    /// Parses either `local@domain` or `Display Name <local@domain>`.
    ///
    /// Quotes around the display name are removed.
    pub fn parse(mailbox: &str) -> Result<Self, ValidationError> {
        let mailbox = mailbox.trim();
        if !mailbox.ends_with('>') {
            return Mailbox::new(None, mailbox);
        }
        let start = mailbox.rfind('<').ok_or_else(|| ValidationError::InvalidAddress {
            address: mailbox.to_owned(),
        })?;
        let email = &mailbox[start + 1..mailbox.len() - 1];
        let name = mailbox[..start].trim();
        let name = if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
            &name[1..name.len() - 1]
        } else {
            name
        };
        Mailbox::new(Some(name), email)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_ref().map(|s| &**s)
    }

    pub fn email(&self) -> &Email {
        &self.email
    }
}

impl From<Email> for Mailbox {
    fn from(email: Email) -> Self {
        Mailbox {
            display_name: None,
            email,
        }
    }
}

impl FromStr for Mailbox {
    type Err = ValidationError;

    fn from_str(inp: &str) -> Result<Self, Self::Err> {
        Mailbox::parse(inp)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        match self.display_name {
            Some(ref name) => write!(fter, "{} <{}>", name, self.email),
            None => write!(fter, "{}", self.email),
        }
    }
}
