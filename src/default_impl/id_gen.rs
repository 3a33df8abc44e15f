use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand;
use soft_ascii_string::SoftAsciiString;
use url::Host;

use crate::{
    content_id::{ContentId, MessageId},
    context::MailIdGenComponent,
    error::ValidationError,
};

static MAIL_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn counter_next() -> usize {
    MAIL_COUNTER.fetch_add(1, Ordering::AcqRel)
}

fn anonymize_through_random_hash(num: usize) -> u64 {
    let rnum = rand::random::<u32>();
    let mut hasher = DefaultHasher::new();
    hasher.write_usize(num);
    hasher.write_u32(rnum);
    hasher.finish()
}

fn gen_next_program_unique_number() -> u64 {
    anonymize_through_random_hash(counter_next())
}

/// A id gen implementation using hashing to generate part of the message id's left hand side.
///
/// Content ids are random lower case letters, see `ContentId::random`.
#[derive(Debug, Clone)]
pub struct HashedIdGen {
    domain: SoftAsciiString,
    part_unique_in_domain: SoftAsciiString,
}

impl HashedIdGen {
    /// Create a new id gen from a domain and a unique part.
    ///
    /// The domain is used as the right hand side of the message
    /// id and the `unique_in_domain_part` is concatenated with `"."`
    /// and a hash for the left hand side. The hash is generated from
    /// a program global counter and a random number.
    ///
    /// The tuple (`domain`,`part_unique_in_domain`) has to be world unique.
    /// I.e. for "your" domain you have to make sure the `part_unique_in_domain`
    /// is unique in it's usage for message id's, e.g. by passing in different
    /// bytes every time the program is started.
    ///
    /// # Error
    ///
    /// If the domain is invalid (non ascii domains are puny code encoded) or
    /// the unique part contains characters which can't be used in a message id.
    pub fn new(domain: &str, part_unique_in_domain: &str) -> Result<Self, ValidationError> {
        let domain = match Host::parse(domain) {
            Ok(Host::Domain(domain)) => domain,
            _ => {
                return Err(ValidationError::InvalidDomain {
                    domain: domain.to_owned(),
                })
            }
        };

        let valid_part = !part_unique_in_domain.is_empty()
            && part_unique_in_domain
                .bytes()
                .all(|bch| bch.is_ascii_alphanumeric() || b"!#$%&'*+-/=?^_`{|}~.".contains(&bch));
        if !valid_part {
            return Err(ValidationError::InvalidIdPart {
                part: part_unique_in_domain.to_owned(),
            });
        }

        Ok(HashedIdGen {
            domain: SoftAsciiString::from_unchecked(domain),
            part_unique_in_domain: SoftAsciiString::from_unchecked(part_unique_in_domain),
        })
    }

    pub fn domain(&self) -> &str {
        self.domain.as_str()
    }
}

impl MailIdGenComponent for HashedIdGen {
    fn generate_message_id(&self) -> MessageId {
        let msg_id = format!(
            "{unique}.{hash:x}@{domain}",
            unique = self.part_unique_in_domain,
            hash = gen_next_program_unique_number(),
            domain = self.domain
        );
        MessageId::from_unchecked(msg_id)
    }

    fn generate_content_id(&self) -> ContentId {
        ContentId::random()
    }
}
