use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::listing::QuestionList;
use crate::session::Session;
use crate::toast::Toasts;

/// What to send when flipping a question's approval: approving names the
/// operator, disapproving clears the approver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalChange<'a> {
    pub is_approved: bool,
    pub approved_by: Option<&'a str>,
}

impl<'a> ApprovalChange<'a> {
    pub fn toggled(currently_approved: bool, operator: &'a Session) -> Self {
        let is_approved = !currently_approved;
        ApprovalChange {
            is_approved,
            approved_by: is_approved.then_some(operator.id.as_str()),
        }
    }
}

/// Flips approval of `question_id`. The local row is only touched once the
/// backend has confirmed, and then replaced with the backend's copy.
pub async fn toggle_approval(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    session: Option<&Session>,
    question_id: &str,
    toasts: &mut Toasts,
) -> bool {
    let Some(operator) = session else {
        toasts.error("User not logged in");
        return false;
    };
    let current = match list.lock().await.find(question_id) {
        Some(question) => question.is_approved,
        None => {
            toasts.error("Question not found. Please reload the list.");
            return false;
        }
    };
    let change = ApprovalChange::toggled(current, operator);
    match api
        .set_approval(question_id, change.is_approved, change.approved_by)
        .await
    {
        Ok(question) => {
            list.lock().await.replace_one(question);
            tracing::info!(question_id, approved = change.is_approved, operator = %operator.id, "Approval changed");
            toasts.success(if change.is_approved {
                "Question approved successfully!"
            } else {
                "Question disapproved successfully!"
            });
            true
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to update approval status. Please try again."));
            false
        }
    }
}
