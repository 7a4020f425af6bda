//! gRPC service implementation for user record management.
//!
//! This module defines [`UserService`], the concrete implementation of the
//! [`UserManagement`] gRPC service defined in the protobuf specification.
//!
//! ## Responsibilities
//!
//! - Validate inbound requests before any store access.
//! - Enforce email uniqueness and existence checks around store mutations.
//! - Project stored records into wire messages.
//! - Answer business-rule failures with `success = false` replies and
//!   surface internal faults as a generic `INTERNAL` status.
//! - Stream `ListUsers` results from a snapshot, honoring cancellation.

use crate::server::{
    config::ServerConfig,
    service::lifecycle::Lifecycle,
    store::{UserDraft, UserRecord, UserStore},
    streaming::enumerator::{select_users, stream_users},
    telemetry::{increment_failures, increment_records_streamed, increment_requests},
    validation::{validate_create, validate_id, validate_update},
};
use core::pin::Pin;
use roster_tonic_core::{
    Error,
    proto::{
        CreateUserRequest, DeleteUserReply, DeleteUserRequest, GetUserRequest, ListUsersRequest,
        UpdateUserRequest, User, UserReply, user_management_server::UserManagement,
    },
    types::UserId,
};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status};
use tracing::Instrument;

/// In-memory user record service.
///
/// Cheap to clone: every clone shares the same [`UserStore`] and shutdown
/// state.
#[derive(Clone)]
pub struct UserService {
    config: ServerConfig,
    store: Arc<UserStore>,
    lifecycle: Arc<Lifecycle>,
}

impl UserService {
    /// Creates a service over a fresh, empty store.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(UserStore::new()))
    }

    pub fn with_store(config: ServerConfig, store: Arc<UserStore>) -> Self {
        let lifecycle = Arc::new(Lifecycle::new(config.shutdown_timeout));
        Self {
            config,
            store,
            lifecycle,
        }
    }

    /// Refuses new calls, drains in-flight streams, then cancels the rest.
    pub async fn shutdown(&self) {
        self.lifecycle.shutdown().await;
    }

    /// Validates, rejects duplicate emails, and inserts a new user.
    pub fn create(&self, req: CreateUserRequest) -> Result<Arc<UserRecord>, Error> {
        validate_create(&req)?;

        if self.store.email_exists(&req.email, None) {
            return Err(Error::Conflict { email: req.email });
        }

        self.store.create(UserDraft {
            name: req.name,
            email: req.email,
            age: req.age,
        })
    }

    pub fn get(&self, id: UserId) -> Result<Arc<UserRecord>, Error> {
        validate_id(id)?;
        self.store.get(id)
    }

    /// Validates, confirms the user exists, rejects an email owned by another
    /// user, and replaces the mutable fields.
    pub fn update(&self, req: UpdateUserRequest) -> Result<Arc<UserRecord>, Error> {
        validate_update(&req)?;
        self.store.get(req.id)?;

        if self.store.email_exists(&req.email, Some(req.id)) {
            return Err(Error::Conflict { email: req.email });
        }

        self.store.update(
            req.id,
            UserDraft {
                name: req.name,
                email: req.email,
                age: req.age,
            },
        )
    }

    pub fn delete(&self, id: UserId) -> Result<(), Error> {
        validate_id(id)?;
        if self.store.delete(id) {
            Ok(())
        } else {
            Err(Error::NotFound { id })
        }
    }
}

/// Converts a failed outcome into the reply message, or into a transport
/// status for errors that are not business-rule failures.
fn reject(rpc: &'static str, err: Error) -> Result<String, Status> {
    increment_failures(rpc, err.kind());
    if err.is_business() {
        tracing::info!(rpc, kind = err.kind(), "Rejected: {err}");
        Ok(err.to_string())
    } else {
        tracing::error!(rpc, kind = err.kind(), "Failed: {err}");
        Err(err.into())
    }
}

fn user_reply(
    rpc: &'static str,
    outcome: Result<Arc<UserRecord>, Error>,
    message: &str,
) -> Result<Response<UserReply>, Status> {
    let reply = match outcome {
        Ok(record) => UserReply {
            success: true,
            message: message.to_string(),
            user: Some(User::from(record.as_ref())),
        },
        Err(err) => UserReply {
            success: false,
            message: reject(rpc, err)?,
            user: None,
        },
    };
    Ok(Response::new(reply))
}

/// Waits for a `ListUsers` producer and reports how it ended.
///
/// A shutdown abort or a producer panic is sent to the client as the final
/// stream item. A panic surfaces as a generic `INTERNAL` status.
async fn supervise_stream(
    producer: JoinHandle<roster_tonic_core::Result<usize>>,
    resp_tx: mpsc::Sender<Result<User, Status>>,
) {
    let err = match producer.await {
        Ok(Ok(emitted)) => {
            increment_records_streamed(emitted as u64);
            tracing::debug!(emitted, "ListUsers stream finished");
            return;
        }
        Ok(Err(err)) => {
            tracing::warn!("ListUsers stream aborted: {err}");
            err
        }
        Err(join_err) => {
            let err = Error::internal(format!("ListUsers producer failed: {join_err}"));
            tracing::error!("{err}");
            err
        }
    };

    increment_failures("ListUsers", err.kind());
    if let Err(_e) = resp_tx.send(Err(err.into())).await {
        tracing::debug!("Client gone before the stream failure could be reported");
    }
}

#[tonic::async_trait]
impl UserManagement for UserService {
    type ListUsersStream = Pin<Box<dyn Stream<Item = Result<User, Status>> + Send>>;

    #[tracing::instrument(skip_all, fields(name = %req.get_ref().name, email = %req.get_ref().email, age = req.get_ref().age))]
    async fn create_user(
        &self,
        req: Request<CreateUserRequest>,
    ) -> Result<Response<UserReply>, Status> {
        increment_requests("CreateUser");
        self.lifecycle.ensure_accepting()?;

        let outcome = self.create(req.into_inner());
        if let Ok(record) = &outcome {
            tracing::info!(id = record.id, "User created");
        }
        user_reply("CreateUser", outcome, "User created successfully")
    }

    #[tracing::instrument(skip_all, fields(id = req.get_ref().id))]
    async fn get_user(&self, req: Request<GetUserRequest>) -> Result<Response<UserReply>, Status> {
        increment_requests("GetUser");
        self.lifecycle.ensure_accepting()?;

        let outcome = self.get(req.get_ref().id);
        user_reply("GetUser", outcome, "User retrieved successfully")
    }

    #[tracing::instrument(skip_all, fields(id = req.get_ref().id))]
    async fn update_user(
        &self,
        req: Request<UpdateUserRequest>,
    ) -> Result<Response<UserReply>, Status> {
        increment_requests("UpdateUser");
        self.lifecycle.ensure_accepting()?;

        let outcome = self.update(req.into_inner());
        if let Ok(record) = &outcome {
            tracing::info!(id = record.id, "User updated");
        }
        user_reply("UpdateUser", outcome, "User updated successfully")
    }

    #[tracing::instrument(skip_all, fields(id = req.get_ref().id))]
    async fn delete_user(
        &self,
        req: Request<DeleteUserRequest>,
    ) -> Result<Response<DeleteUserReply>, Status> {
        increment_requests("DeleteUser");
        self.lifecycle.ensure_accepting()?;

        let reply = match self.delete(req.get_ref().id) {
            Ok(()) => {
                tracing::info!("User deleted");
                DeleteUserReply {
                    success: true,
                    message: "User deleted successfully".to_string(),
                }
            }
            Err(err) => DeleteUserReply {
                success: false,
                message: reject("DeleteUser", err)?,
            },
        };
        Ok(Response::new(reply))
    }

    /// Streams a snapshot of the store, filtered and truncated per the
    /// request.
    ///
    /// The store is only locked while the snapshot is taken. A producer task
    /// feeds the response channel and stops as soon as the client goes away
    /// or the service shuts down. A panic in the producer is logged and
    /// reported to the client as `INTERNAL`.
    #[tracing::instrument(skip_all, fields(filter = %req.get_ref().filter, page_size = req.get_ref().page_size))]
    async fn list_users(
        &self,
        req: Request<ListUsersRequest>,
    ) -> Result<Response<Self::ListUsersStream>, Status> {
        increment_requests("ListUsers");
        self.lifecycle.ensure_accepting()?;

        let ListUsersRequest { filter, page_size } = req.into_inner();
        let selected = select_users(self.store.list_all(), &filter, page_size);
        tracing::info!(count = selected.len(), stored = self.store.len(), "Streaming users");

        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<User, Status>>(self.config.stream_buffer_size);
        let guard = self.lifecycle.stream_started();

        let producer = tokio::spawn(
            stream_users(
                selected,
                resp_tx.clone(),
                self.lifecycle.shutdown_token(),
                self.config.stream_delay,
            )
            .in_current_span(),
        );

        let supervisor = async move {
            let _guard = guard;
            supervise_stream(producer, resp_tx).await;
        };
        tokio::spawn(supervisor.in_current_span());

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}
