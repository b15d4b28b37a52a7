use anyhow::Result;
use serde_json::json;

use super::client::HhClient;
use super::types::HhVacancy;

impl HhClient {
    pub async fn get_vacancy(&self, vacancy_id: &str) -> Result<HhVacancy> {
        self.get_json(&format!("/vacancies/{}", vacancy_id), &[])
            .await
    }

    /// Invite a candidate to a published vacancy. Returns the invitation id
    /// when hh.ru reports one.
    pub async fn send_invitation(
        &self,
        vacancy_id: &str,
        resume_id: &str,
        message: &str,
    ) -> Result<Option<String>> {
        let payload = json!({
            "vacancy_id": vacancy_id,
            "resume_id": resume_id,
            "message": message,
        });
        let response = self.post_json("/invitations", &payload).await?;
        Ok(response.as_ref().and_then(extract_id))
    }
}

pub(crate) fn extract_id(value: &serde_json::Value) -> Option<String> {
    match value.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
