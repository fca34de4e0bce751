//! Multipart assembly for attachment uploads.
//!
//! The wire invariant (mirrored from the reference implementation's
//! `_post()`): the JSON body's `attachments[]` entries and the multipart
//! `files[i]` parts are coupled by index — `attachments[i].id == i`. This
//! module is the single place that builds both halves together so callers
//! never construct `attachments` independently of the file list.

use crate::error::{FluxError, FluxResult};
use crate::model::AttachmentUpload;
use serde_json::{json, Value};

pub struct MultipartPlan {
    pub payload_json: Value,
    pub files: Vec<AttachmentUpload>,
}

/// Merges `attachments[].id`/`filename`/`description` into `body` for each
/// file in `files`, in order, then returns the plan ready for
/// [`multipart_form`].
pub fn build_multipart_plan(mut body: Value, files: Vec<AttachmentUpload>) -> MultipartPlan {
    let attachments: Vec<Value> = files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let mut entry = json!({
                "id": i,
                "filename": file.filename,
            });
            if let Some(description) = &file.description {
                entry["description"] = Value::String(description.clone());
            }
            entry
        })
        .collect();
    if let Some(object) = body.as_object_mut() {
        object.insert("attachments".to_string(), Value::Array(attachments));
    }
    MultipartPlan {
        payload_json: body,
        files,
    }
}

pub fn multipart_form(plan: &MultipartPlan) -> FluxResult<reqwest::multipart::Form> {
    let payload =
        serde_json::to_vec(&plan.payload_json).map_err(|error| FluxError::MultipartCreation {
            error: error.to_string(),
        })?;
    let mut form = reqwest::multipart::Form::new().part(
        "payload_json",
        reqwest::multipart::Part::bytes(payload).mime_str("application/json").map_err(|error| {
            FluxError::MultipartCreation {
                error: error.to_string(),
            }
        })?,
    );
    for (i, file) in plan.files.iter().enumerate() {
        let mut part = reqwest::multipart::Part::bytes(file.content.clone())
            .file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|error| FluxError::MultipartCreation {
                    error: error.to_string(),
                })?;
        }
        form = form.part(format!("files[{i}]"), part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attachment_ids_match_file_indices() {
        let files = vec![
            AttachmentUpload::new("a.png", b"x".to_vec()).with_content_type("image/png"),
            AttachmentUpload::new("b.png", b"y".to_vec()).with_content_type("image/png"),
        ];
        let plan = build_multipart_plan(json!({"content": "hi"}), files);
        let attachments = plan.payload_json["attachments"].as_array().unwrap();
        assert_eq!(attachments[0]["id"], 0);
        assert_eq!(attachments[1]["id"], 1);
        assert_eq!(attachments[0]["filename"], "a.png");
    }

    #[test]
    fn omits_description_key_when_none_supplied() {
        let files = vec![AttachmentUpload::new("a.png", b"x".to_vec())];
        let plan = build_multipart_plan(json!({"content": "hi"}), files);
        let attachments = plan.payload_json["attachments"].as_array().unwrap();
        assert!(attachments[0].get("description").is_none());
    }

    #[test]
    fn includes_description_key_when_supplied() {
        let files = vec![AttachmentUpload::new("a.png", b"x".to_vec()).with_description("d")];
        let plan = build_multipart_plan(json!({"content": "hi"}), files);
        let attachments = plan.payload_json["attachments"].as_array().unwrap();
        assert_eq!(attachments[0]["description"], "d");
    }
}
