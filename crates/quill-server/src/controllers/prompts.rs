use quill_router::{BoxFuture, Request, Response, Result};
use quill_store::{NewPrompt, PromptChanges, PromptFilter, PromptRepository};
use serde_json::json;

use super::{body_object, message, not_found, path_id, reject};

#[derive(Debug, Clone)]
pub struct PromptController {
    prompts: PromptRepository,
}

impl PromptController {
    pub const fn new(prompts: PromptRepository) -> Self {
        Self { prompts }
    }

    /// `GET /` with `page`, `limit`, `search`, `tags`, `sortBy` and `sortOrder`.
    pub fn index<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let filter = match PromptFilter::from_query(req.query()) {
                Ok(filter) => filter,
                Err(err) => return reject(res, err, "Failed to fetch prompts: "),
            };

            let page = match self.prompts.find_all_with_filters(&filter).await {
                Ok(prompts) => self
                    .prompts
                    .count_all_with_filters(&filter)
                    .await
                    .map(|total| (prompts, total)),
                Err(err) => Err(err),
            };

            match page {
                Ok((prompts, total)) => {
                    res.emit_json(&json!({"prompts": prompts, "total": total}), 200)
                }
                Err(err) => reject(res, err, "Failed to fetch prompts: "),
            }
        })
    }

    /// `GET /{id}`
    pub fn show<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            match self.prompts.find_by_id(id).await {
                Ok(Some(prompt)) => res.emit_json(&prompt, 200),
                Ok(None) => not_found(res, "Prompt not found"),
                Err(err) => reject(res, err, "Failed to fetch prompt: "),
            }
        })
    }

    /// `POST /`
    pub fn create<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let saved = match NewPrompt::from_json(&body_object(req)) {
                Ok(prompt) => self.prompts.save(&prompt).await,
                Err(err) => Err(err),
            };

            match saved {
                Ok(prompt) => res.emit_json(
                    &json!({"message": "Prompt created successfully", "prompt": prompt}),
                    201,
                ),
                Err(err) => reject(res, err, "Failed to create prompt: "),
            }
        })
    }

    /// `PUT /{id}`
    pub fn update<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            let updated = match PromptChanges::from_json(&body_object(req)) {
                Ok(changes) => self.prompts.update_by_id(id, &changes).await,
                Err(err) => Err(err),
            };

            match updated {
                Ok(true) => message(res, "Prompt updated successfully", 200),
                Ok(false) => not_found(res, "Prompt not found"),
                Err(err) => reject(res, err, "Failed to update prompt: "),
            }
        })
    }

    /// `DELETE /{id}`
    pub fn destroy<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            match self.prompts.delete_by_id(id).await {
                Ok(true) => message(res, "Prompt deleted successfully", 200),
                Ok(false) => not_found(res, "Prompt not found"),
                Err(err) => reject(res, err, "Failed to delete prompt: "),
            }
        })
    }
}
