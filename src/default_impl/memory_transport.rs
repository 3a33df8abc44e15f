use std::sync::{Arc, Mutex};

use crate::{
    address::Email,
    mail::EncodableMail,
    transport::{Endpoint, Transport},
};

/// A mail "send" through a `MemoryTransport`.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub sender: Email,
    pub recipients: Vec<Email>,
    pub message_id: String,
    pub bytes: Vec<u8>,
}

/// A transport which keeps all mails in memory instead of sending them.
///
/// Clones share the list of sent mails, so a clone can be handed to the
/// `Email` builder while the original is used to inspect what was sent.
/// It can be switched into failing mode, which makes every send fail.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    endpoint: Endpoint,
    sent: Arc<Mutex<Vec<SentMail>>>,
    fail_with: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        MemoryTransport {
            endpoint: Endpoint::new("localhost", 25),
            sent: Default::default(),
            fail_with: None,
        }
    }

    /// Uses the given endpoint when reporting errors.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Makes every send fail with given message.
    pub fn failing(mut self, msg: impl Into<String>) -> Self {
        self.fail_with = Some(msg.into());
        self
    }

    /// Returns a copy of all mails sent so far.
    pub fn sent_mails(&self) -> Vec<SentMail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        MemoryTransport::new()
    }
}

impl Transport for MemoryTransport {
    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    fn send(&mut self, mail: &EncodableMail) -> Result<(), failure::Error> {
        if let Some(ref msg) = self.fail_with {
            bail!("{}", msg);
        }
        let bytes = mail.encode_into_bytes()?;
        let envelope = mail.envelope();
        let sent = SentMail {
            sender: envelope.sender().clone(),
            recipients: envelope.recipients().iter().cloned().collect(),
            message_id: mail.message_id().as_str().to_owned(),
            bytes,
        };
        debug!("stored mail {} in memory", sent.message_id);
        self.sent
            .lock()
            .map_err(|_| format_err!("list of sent mails is poisoned"))?
            .push(sent);
        Ok(())
    }
}
