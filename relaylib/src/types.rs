use uuid::Uuid;

pub type OwnerId = String;
pub type Program = String;
pub type Args = Vec<String>;
pub type JobId = Uuid;
