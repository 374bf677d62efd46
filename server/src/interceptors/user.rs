use crate::services::relayservice::UserId;
use tonic::{Request, Status};

/// Metadata key carrying the caller's identity.
pub const USER_ID_KEY: &str = "x-user-id";

/// A tonic interceptor service function.
///
/// Takes the caller-supplied user id from the request metadata and adds it to the request extensions.
/// The id is trusted as-is, there is no authentication beyond requiring one.
pub fn extract_user_id(mut req: Request<()>) -> Result<Request<()>, Status> {
    let user_id = req
        .metadata()
        .get(USER_ID_KEY)
        .ok_or_else(|| Status::unauthenticated("Request missing x-user-id"))?
        .to_str()
        .map_err(|_| Status::unauthenticated("x-user-id must be ASCII"))?
        .trim()
        .to_string();
    if user_id.is_empty() {
        return Err(Status::unauthenticated("x-user-id must not be empty"));
    }
    req.extensions_mut().insert(UserExtension { user_id });
    Ok(req)
}

#[derive(Clone, Debug)]
pub struct UserExtension {
    pub user_id: UserId,
}
