use anyhow::Result;

use super::client::HhClient;
use super::types::{Resume, ResumePage};
use crate::config::SearchParams;

impl HhClient {
    /// Search résumés. `page` is zero-based, as in the hh.ru API.
    pub async fn search_resumes(
        &self,
        params: &SearchParams,
        page: u32,
        per_page: u32,
    ) -> Result<ResumePage> {
        let mut query = params.query_pairs();
        query.push(("page", page.to_string()));
        query.push(("per_page", per_page.to_string()));

        let result: ResumePage = self.get_json("/resumes", &query).await?;
        tracing::debug!(
            page,
            found = result.found,
            items = result.items.len(),
            "résumé page fetched"
        );
        Ok(result)
    }

    /// Fetch a full résumé including contacts
    pub async fn get_resume(&self, resume_id: &str) -> Result<Resume> {
        self.get_json(
            &format!("/resumes/{}", resume_id),
            &[("with_fields", "contacts".to_string())],
        )
        .await
    }
}
