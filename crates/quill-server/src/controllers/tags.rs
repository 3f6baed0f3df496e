use quill_router::{BoxFuture, Request, Response, Result};
use quill_store::{NewTag, TagChanges, TagRepository};
use serde_json::json;

use super::{body_object, message, not_found, path_id, reject};

#[derive(Debug, Clone)]
pub struct TagController {
    tags: TagRepository,
}

impl TagController {
    pub const fn new(tags: TagRepository) -> Self {
        Self { tags }
    }

    pub fn index<'a>(
        &'a self,
        _req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self.tags.list().await {
                Ok(tags) => {
                    res.emit_json(&json!({"total": tags.len(), "tags": tags}), 200)
                }
                Err(err) => reject(res, err, "Failed to fetch tags: "),
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

            match self.tags.find_by_id(id).await {
                Ok(Some(tag)) => res.emit_json(&tag, 200),
                Ok(None) => not_found(res, "Tag not found"),
                Err(err) => reject(res, err, "Failed to fetch tag: "),
            }
        })
    }

    pub fn create<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let saved = match NewTag::from_json(&body_object(req)) {
                Ok(tag) => self.tags.save(&tag).await,
                Err(err) => Err(err),
            };

            match saved {
                Ok(tag) => res.emit_json(
                    &json!({"message": "Tag created successfully", "tag": tag}),
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

            let updated = match TagChanges::from_json(&body_object(req)) {
                Ok(changes) => self.tags.update_by_id(id, &changes).await,
                Err(err) => Err(err),
            };

            match updated {
                Ok(true) => message(res, "Tag updated successfully", 200),
                Ok(false) => not_found(res, "Tag not found"),
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

            match self.tags.delete_by_id(id).await {
                Ok(true) => message(res, "Tag deleted successfully", 200),
                Ok(false) => not_found(res, "Tag not found"),
                Err(err) => reject(res, err, "Failed to delete tag: "),
            }
        })
    }
}
