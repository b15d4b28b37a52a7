use anyhow::Result;
use serde_json::json;

use super::client::HhClient;
use super::types::NegotiationPage;
use super::vacancies::extract_id;

impl HhClient {
    /// List negotiation threads, optionally narrowed to one vacancy
    pub async fn list_negotiations(
        &self,
        vacancy_id: Option<&str>,
        page: u32,
    ) -> Result<NegotiationPage> {
        let mut query = vec![("page", page.to_string())];
        if let Some(id) = vacancy_id {
            query.push(("vacancy_id", id.to_string()));
        }
        self.get_json_fresh("/negotiations", &query).await
    }

    /// Post a message into a negotiation thread. Returns the message id
    /// when hh.ru reports one.
    pub async fn send_negotiation_message(
        &self,
        negotiation_id: &str,
        text: &str,
    ) -> Result<Option<String>> {
        let payload = json!({ "message": text });
        let response = self
            .post_json(&format!("/negotiations/{}/messages", negotiation_id), &payload)
            .await?;
        Ok(response.as_ref().and_then(extract_id))
    }
}
