//! In-process transport.
//!
//! Conversations live in memory and record everything sent into them.
//! Failure injection (`fail_receiver`, `deny_admin`) lets callers exercise
//! the error paths of the bot layer without a network.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    async_trait::async_trait,
    msgkit_common::ids,
    msgkit_protocol::{Attachment, DecodedMessage, Member, OutboundContent, RemoteAttachment},
    tracing::debug,
};

use crate::{Conversation, Error, Result, TransportClient};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory [`TransportClient`].
pub struct MemoryTransport {
    address: String,
    inbox_id: String,
    direct: Mutex<HashMap<String, Arc<MemoryConversation>>>,
    failing_receivers: Mutex<HashSet<String>>,
    attachments: Mutex<HashMap<String, Attachment>>,
    messages: Mutex<HashMap<String, DecodedMessage>>,
}

impl MemoryTransport {
    pub fn new(address: impl Into<String>, inbox_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            inbox_id: inbox_id.into(),
            direct: Mutex::new(HashMap::new()),
            failing_receivers: Mutex::new(HashSet::new()),
            attachments: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
        }
    }

    /// The bot itself as a conversation member.
    pub fn as_member(&self) -> Member {
        Member::new(self.inbox_id.clone(), self.address.clone())
    }

    /// Make every `new_conversation` call for `address` fail.
    pub fn fail_receiver(&self, address: &str) {
        lock(&self.failing_receivers).insert(ids::normalize(address));
    }

    /// Serve `attachment` for remote attachments pointing at `url`.
    pub fn insert_attachment(&self, url: impl Into<String>, attachment: Attachment) {
        lock(&self.attachments).insert(url.into(), attachment);
    }

    /// Remember an inbound message so `message_by_id` can find it.
    pub fn record_message(&self, message: DecodedMessage) {
        lock(&self.messages).insert(message.id.clone(), message);
    }

    /// Direct conversation previously opened with `address`, if any.
    pub fn direct_conversation(&self, address: &str) -> Option<Arc<MemoryConversation>> {
        lock(&self.direct).get(&ids::normalize(address)).cloned()
    }
}

#[async_trait]
impl TransportClient for MemoryTransport {
    fn account_address(&self) -> &str {
        &self.address
    }

    fn inbox_id(&self) -> &str {
        &self.inbox_id
    }

    async fn new_conversation(&self, address: &str) -> Result<Arc<dyn Conversation>> {
        let key = ids::normalize(address);
        if lock(&self.failing_receivers).contains(&key) {
            return Err(Error::unavailable(format!("cannot reach {key}")));
        }
        let conversation = lock(&self.direct)
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(peer = %key, "opening in-memory direct conversation");
                Arc::new(MemoryConversation::new(format!("dm:{key}"), vec![
                    self.as_member(),
                    Member::new(key.clone(), key.clone()),
                ]))
            })
            .clone();
        Ok(conversation)
    }

    async fn load_attachment(&self, remote: &RemoteAttachment) -> Result<Attachment> {
        lock(&self.attachments)
            .get(&remote.url)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("attachment at {}", remote.url)))
    }

    async fn message_by_id(&self, id: &str) -> Result<Option<DecodedMessage>> {
        Ok(lock(&self.messages).get(id).cloned())
    }
}

/// In-memory [`Conversation`] that records outbound content.
pub struct MemoryConversation {
    id: String,
    name: Mutex<Option<String>>,
    members: Mutex<Vec<Member>>,
    /// Identities `add_members` can look up by inbox id.
    directory: Mutex<HashMap<String, Member>>,
    sent: Mutex<Vec<OutboundContent>>,
    deny_admin: AtomicBool,
}

impl MemoryConversation {
    pub fn new(id: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            id: id.into(),
            name: Mutex::new(None),
            members: Mutex::new(members),
            directory: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            deny_admin: AtomicBool::new(false),
        }
    }

    /// Reject privileged mutations as if the bot were not a group admin.
    pub fn deny_admin(&self, deny: bool) {
        self.deny_admin.store(deny, Ordering::Relaxed);
    }

    pub fn name(&self) -> Option<String> {
        lock(&self.name).clone()
    }

    /// Everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<OutboundContent> {
        lock(&self.sent).clone()
    }

    /// Drain the sent log.
    pub fn take_sent(&self) -> Vec<OutboundContent> {
        std::mem::take(&mut *lock(&self.sent))
    }

    pub fn add_member(&self, member: Member) {
        lock(&self.members).push(member);
    }

    /// Make `member` known to the network, so adding its inbox id keeps its
    /// addresses.
    pub fn register_identity(&self, member: Member) {
        lock(&self.directory).insert(ids::normalize(&member.inbox_id), member);
    }

    fn check_admin(&self, action: &str) -> Result<()> {
        if self.deny_admin.load(Ordering::Relaxed) {
            Err(Error::permission_denied(action))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Conversation for MemoryConversation {
    fn id(&self) -> &str {
        &self.id
    }

    async fn members(&self) -> Result<Vec<Member>> {
        Ok(lock(&self.members).clone())
    }

    async fn send(&self, content: OutboundContent) -> Result<String> {
        lock(&self.sent).push(content);
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn update_name(&self, name: &str) -> Result<()> {
        self.check_admin("update group name")?;
        *lock(&self.name) = Some(name.to_string());
        Ok(())
    }

    async fn add_members(&self, inbox_ids: &[String]) -> Result<()> {
        self.check_admin("add members")?;
        let mut members = lock(&self.members);
        for inbox_id in inbox_ids {
            if members.iter().any(|m| ids::same(&m.inbox_id, inbox_id)) {
                return Err(Error::invalid_input(format!(
                    "{inbox_id} is already a member"
                )));
            }
        }
        let directory = lock(&self.directory);
        members.extend(inbox_ids.iter().map(|inbox_id| {
            directory
                .get(&ids::normalize(inbox_id))
                .cloned()
                .unwrap_or_else(|| Member {
                    inbox_id: inbox_id.clone(),
                    account_addresses: Vec::new(),
                    username: None,
                })
        }));
        Ok(())
    }

    async fn remove_members(&self, addresses: &[String]) -> Result<()> {
        self.check_admin("remove members")?;
        let mut members = lock(&self.members);
        let before = members.len();
        members.retain(|m| {
            !m.account_addresses
                .iter()
                .any(|a| addresses.iter().any(|target| ids::same(a, target)))
        });
        if members.len() == before {
            return Err(Error::not_found("no matching members"));
        }
        Ok(())
    }
}
