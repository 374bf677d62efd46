mod commands;
use self::commands::{BotCommand, HELP};

use crate::UserExtension;
use protobuf::stream_relay_server::StreamRelay;
use protobuf::{
    CommandRequest, CommandResponse, StartRequest, StartResponse, StatusRequest, StatusResponse,
    StopRequest, StopResponse,
};
use relaylib::{error::Error as RelayError, CommandSpec, Supervisor};
use tonic::{Request, Response, Status};
use tracing::{debug, info};

pub type UserId = relaylib::types::OwnerId;

// tonic wraps this in Arc anyway internally, so we don't need Arc
pub struct RelayService {
    supervisor: Supervisor,
    transcoder: String,
}

impl RelayService {
    pub fn new(supervisor: Supervisor, transcoder: impl Into<String>) -> Self {
        Self {
            supervisor,
            transcoder: transcoder.into(),
        }
    }

    async fn start(
        &self,
        user_id: UserId,
        source_url: &str,
        destination_base: &str,
        stream_key: &str,
    ) -> relaylib::error::Result<String> {
        let spec = CommandSpec::build(source_url, destination_base, stream_key)
            .with_program(self.transcoder.as_str());
        let started = self.supervisor.start_job(user_id, spec).await?;
        Ok(started.to_string())
    }

    async fn stop(&self, user_id: UserId) -> relaylib::error::Result<String> {
        let stopped = self.supervisor.stop_job(user_id).await?;
        Ok(stopped.to_string())
    }

    /// Run one chat command and produce the reply. Failures are replies too.
    async fn dispatch(&self, user_id: UserId, text: &str) -> String {
        let command = match commands::parse(text) {
            Ok(command) => command,
            Err(err) => return err.reply().to_string(),
        };
        debug!(user = %user_id, ?command, "chat command");
        let result = match command {
            BotCommand::Help => Ok(HELP.to_string()),
            BotCommand::Stream {
                source_url,
                destination_base,
                stream_key,
            } => {
                self.start(user_id, source_url, destination_base, stream_key)
                    .await
            }
            BotCommand::Stop => self.stop(user_id).await,
            BotCommand::Status => self
                .supervisor
                .job_status(user_id)
                .await
                .map(|info| info.to_string()),
        };
        result.unwrap_or_else(|err| err.to_string())
    }
}

fn user_id<T>(req: &Request<T>) -> Result<UserId, Status> {
    req.extensions()
        .get::<UserExtension>()
        .map(|user| user.user_id.clone())
        .ok_or_else(|| Status::unauthenticated("Request missing x-user-id"))
}

fn to_status(err: RelayError) -> Status {
    let message = err.to_string();
    match err {
        RelayError::AlreadyRunning => Status::already_exists(message),
        RelayError::NotRunning => Status::failed_precondition(message),
        RelayError::LaunchFailed(_) => Status::internal(message),
        RelayError::ShuttingDown | RelayError::SupervisorGone => Status::unavailable(message),
    }
}

#[tonic::async_trait]
impl StreamRelay for RelayService {
    async fn start_stream(
        &self,
        req: Request<StartRequest>,
    ) -> Result<Response<StartResponse>, Status> {
        let user_id = user_id(&req)?;
        let StartRequest {
            source_url,
            destination_base,
            stream_key,
        } = req.into_inner();

        info!(user = %user_id, %source_url, "start stream requested");
        let message = self
            .start(user_id, &source_url, &destination_base, &stream_key)
            .await
            .map_err(to_status)?;
        Ok(Response::new(StartResponse { message }))
    }

    async fn stop_stream(&self, req: Request<StopRequest>) -> Result<Response<StopResponse>, Status> {
        let user_id = user_id(&req)?;
        info!(user = %user_id, "stop stream requested");
        let message = self.stop(user_id).await.map_err(to_status)?;
        Ok(Response::new(StopResponse { message }))
    }

    async fn query_status(
        &self,
        req: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, Status> {
        let user_id = user_id(&req)?;
        let response = match self.supervisor.job_status(user_id).await {
            Ok(info) => StatusResponse {
                active: true,
                message: info.to_string(),
            },
            Err(err @ RelayError::NotRunning) => StatusResponse {
                active: false,
                message: err.to_string(),
            },
            Err(err) => return Err(to_status(err)),
        };
        Ok(Response::new(response))
    }

    async fn send_command(
        &self,
        req: Request<CommandRequest>,
    ) -> Result<Response<CommandResponse>, Status> {
        let user_id = user_id(&req)?;
        let reply = self.dispatch(user_id, &req.get_ref().text).await;
        Ok(Response::new(CommandResponse { reply }))
    }
}
