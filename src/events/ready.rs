use crate::model::User;

#[derive(Debug, Clone)]
pub struct ReadyEvent {
    pub user: User,
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
}
