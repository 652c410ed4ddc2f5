use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info};

use bridge_db::{AnswerOutcome, Database, RequestInsert};
use bridge_types::models::{
    Account, AccountId, ConnectionRequest, ConnectionState, ConnectionStatus, RequestStatus,
};

use crate::clock::Clock;
use crate::directory::Directory;
use crate::error::SocialError;

/// A request together with both resolved accounts.
#[derive(Debug, Clone)]
pub struct RequestParties {
    pub request: ConnectionRequest,
    pub sender: Account,
    pub receiver: Account,
}

/// The connection (friend-request) state machine.
pub trait ConnectionService: Send + Sync {
    /// Opens a PENDING request from `sender_id` to `receiver_id`.
    fn send_request(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
    ) -> Result<ConnectionRequest, SocialError>;

    /// Accepts or rejects a PENDING request. The caller is responsible for
    /// checking that the responder is the receiver.
    fn respond(&self, request_id: i64, accept: bool) -> Result<ConnectionRequest, SocialError>;

    fn find_request(&self, request_id: i64) -> Result<Option<ConnectionRequest>, SocialError>;

    /// Removes the active request between the pair. Returns false when there
    /// was nothing to remove.
    fn disconnect(&self, user_a: AccountId, user_b: AccountId) -> Result<bool, SocialError>;

    fn status(
        &self,
        user_id: AccountId,
        other_id: AccountId,
    ) -> Result<ConnectionStatus, SocialError>;

    /// PENDING requests addressed to `user_id`.
    fn list_pending(&self, user_id: AccountId) -> Result<Vec<RequestParties>, SocialError>;

    /// PENDING requests sent by `user_id`.
    fn list_sent(&self, user_id: AccountId) -> Result<Vec<RequestParties>, SocialError>;

    /// Counterparts of every ACCEPTED request, ordered by id.
    fn list_active_connections(&self, user_id: AccountId) -> Result<Vec<Account>, SocialError>;
}

pub struct ConnectionGraph {
    db: Arc<Database>,
    directory: Directory,
    clock: Arc<dyn Clock>,
}

impl ConnectionGraph {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self {
            directory: Directory::new(db.clone()),
            db,
            clock,
        }
    }

    fn with_parties(
        &self,
        requests: Vec<ConnectionRequest>,
    ) -> Result<Vec<RequestParties>, SocialError> {
        let ids: BTreeSet<AccountId> = requests
            .iter()
            .flat_map(|r| [r.sender_id, r.receiver_id])
            .collect();
        let ids: Vec<AccountId> = ids.into_iter().collect();
        let accounts: HashMap<AccountId, Account> = self
            .directory
            .find_many(&ids)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(requests
            .into_iter()
            .filter_map(|request| {
                let sender = accounts.get(&request.sender_id)?.clone();
                let receiver = accounts.get(&request.receiver_id)?.clone();
                Some(RequestParties {
                    request,
                    sender,
                    receiver,
                })
            })
            .collect())
    }
}

impl ConnectionService for ConnectionGraph {
    fn send_request(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
    ) -> Result<ConnectionRequest, SocialError> {
        if sender_id == receiver_id {
            return Err(SocialError::SelfReference);
        }
        self.directory.require(sender_id)?;
        self.directory.require(receiver_id)?;

        match self
            .db
            .insert_connection_request(sender_id, receiver_id, self.clock.now_micros())?
        {
            RequestInsert::Created(request) => {
                info!(
                    "Connection request {} opened: {} -> {}",
                    request.id, sender_id, receiver_id
                );
                Ok(request)
            }
            RequestInsert::Blocked(existing) => {
                debug!(
                    "Connection request {} -> {} blocked by request {} ({})",
                    sender_id, receiver_id, existing.id, existing.status
                );
                Err(blocking_error(&existing, sender_id))
            }
        }
    }

    fn respond(&self, request_id: i64, accept: bool) -> Result<ConnectionRequest, SocialError> {
        let status = if accept {
            RequestStatus::Accepted
        } else {
            RequestStatus::Rejected
        };

        match self.db.answer_connection_request(request_id, status)? {
            AnswerOutcome::Answered(request) => {
                info!(
                    "Connection request {} {} ({} <-> {})",
                    request.id, request.status, request.sender_id, request.receiver_id
                );
                Ok(request)
            }
            AnswerOutcome::NotFound => Err(SocialError::NotFound("Request")),
            AnswerOutcome::AlreadyAnswered(_) => Err(SocialError::RequestAlreadyAnswered),
        }
    }

    fn find_request(&self, request_id: i64) -> Result<Option<ConnectionRequest>, SocialError> {
        Ok(self.db.get_connection_request(request_id)?)
    }

    fn disconnect(&self, user_a: AccountId, user_b: AccountId) -> Result<bool, SocialError> {
        let removed = self.db.delete_active_between(user_a, user_b)? > 0;
        if removed {
            info!("Connection between {} and {} removed", user_a, user_b);
        }
        Ok(removed)
    }

    fn status(
        &self,
        user_id: AccountId,
        other_id: AccountId,
    ) -> Result<ConnectionStatus, SocialError> {
        self.directory.require(other_id)?;
        let request = self.db.find_request_between(user_id, other_id)?;
        Ok(connection_status(user_id, other_id, request.as_ref()))
    }

    fn list_pending(&self, user_id: AccountId) -> Result<Vec<RequestParties>, SocialError> {
        let requests = self.db.list_requests_received(user_id, RequestStatus::Pending)?;
        self.with_parties(requests)
    }

    fn list_sent(&self, user_id: AccountId) -> Result<Vec<RequestParties>, SocialError> {
        let requests = self.db.list_requests_sent(user_id, RequestStatus::Pending)?;
        self.with_parties(requests)
    }

    fn list_active_connections(&self, user_id: AccountId) -> Result<Vec<Account>, SocialError> {
        let counterparts: BTreeSet<AccountId> = self
            .db
            .list_accepted_for(user_id)?
            .iter()
            .map(|r| r.counterpart(user_id))
            .collect();
        let ids: Vec<AccountId> = counterparts.into_iter().collect();
        self.directory.find_many(&ids)
    }
}

/// Maps the active request that blocked a new one to the caller-facing error.
fn blocking_error(existing: &ConnectionRequest, sender_id: AccountId) -> SocialError {
    match existing.status {
        RequestStatus::Accepted => SocialError::AlreadyConnected,
        RequestStatus::Pending if existing.sender_id == sender_id => SocialError::DuplicateRequest,
        RequestStatus::Pending => SocialError::IncomingRequestExists,
        RequestStatus::Rejected => SocialError::Storage(anyhow!(
            "rejected request {} reported as blocking",
            existing.id
        )),
    }
}

/// Connection state and capabilities of `user_id` towards `other_id`.
pub fn connection_status(
    user_id: AccountId,
    other_id: AccountId,
    request: Option<&ConnectionRequest>,
) -> ConnectionStatus {
    let mut status = ConnectionStatus {
        user_id,
        other_user_id: other_id,
        status: ConnectionState::None,
        request_id: None,
        is_sender: None,
        is_connected: false,
        can_connect: user_id != other_id,
        can_accept: false,
        can_cancel: false,
    };

    // A rejected request is inert: the pair is free to connect again.
    let Some(request) = request.filter(|r| r.status.is_active()) else {
        return status;
    };

    let is_sender = request.sender_id == user_id;
    status.request_id = Some(request.id);
    status.is_sender = Some(is_sender);
    status.can_connect = false;

    match request.status {
        RequestStatus::Pending => {
            status.status = if is_sender {
                ConnectionState::PendingOutgoing
            } else {
                ConnectionState::PendingIncoming
            };
            status.can_accept = !is_sender;
            status.can_cancel = is_sender;
        }
        RequestStatus::Accepted => {
            status.status = ConnectionState::Accepted;
            status.is_connected = true;
        }
        RequestStatus::Rejected => {}
    }

    status
}
