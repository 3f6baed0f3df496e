use quill_router::{BoxFuture, Request, Response, Result};
use quill_store::{NewTemplate, TemplateChanges, TemplateRepository};
use serde_json::json;

use super::{body_object, message, not_found, path_id, reject};

/// Templates: named, ordered sequences of prompts.
#[derive(Debug, Clone)]
pub struct TemplateController {
    templates: TemplateRepository,
}

impl TemplateController {
    pub const fn new(templates: TemplateRepository) -> Self {
        Self { templates }
    }

    pub fn index<'a>(
        &'a self,
        _req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self.templates.list().await {
                Ok(templates) => {
                    res.emit_json(&json!({"total": templates.len(), "templates": templates}), 200)
                }
                Err(err) => reject(res, err, "Failed to fetch templates: "),
            }
        })
    }

    pub fn show<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            match self.templates.find_by_id(id).await {
                Ok(Some(template)) => res.emit_json(&template, 200),
                Ok(None) => not_found(res, "Template not found"),
                Err(err) => reject(res, err, "Failed to fetch template: "),
            }
        })
    }

    pub fn create<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let saved = match NewTemplate::from_json(&body_object(req)) {
                Ok(template) => self.templates.save(&template).await,
                Err(err) => Err(err),
            };

            match saved {
                Ok(template) => res.emit_json(
                    &json!({"message": "Template created successfully", "template": template}),
                    201,
                ),
                Err(err) => reject(res, err, ""),
            }
        })
    }

    pub fn update<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            let updated = match TemplateChanges::from_json(&body_object(req)) {
                Ok(changes) => self.templates.update_by_id(id, &changes).await,
                Err(err) => Err(err),
            };

            match updated {
                Ok(true) => message(res, "Template updated successfully", 200),
                Ok(false) => not_found(res, "Template not found"),
                Err(err) => reject(res, err, ""),
            }
        })
    }

    pub fn destroy<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            match self.templates.delete_by_id(id).await {
                Ok(true) => message(res, "Template deleted successfully", 200),
                Ok(false) => not_found(res, "Template not found"),
                Err(err) => reject(res, err, "Failed to delete template: "),
            }
        })
    }
}
