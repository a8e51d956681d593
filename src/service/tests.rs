//! Behaviour of the employee service against the in-memory store and a
//! recording media store.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::*;
use crate::error::ApiError;
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus, NewEmployee};
use crate::store::{EmployeePage, EmployeeRepository, ListQuery};
use crate::test_support::{FakeMedia, MediaCall, PLACEHOLDER_ID, PLACEHOLDER_URL, harness, placeholder, png};

const OWNER: u64 = 1;
const STRANGER: u64 = 2;

fn input(value: Value) -> EmployeeInput {
    let map: Map<String, Value> = match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    EmployeeInput::from_fields(&map).unwrap()
}

fn ada() -> EmployeeInput {
    input(json!({
        "name": "Ada",
        "email": "ada@x.com",
        "position": "Eng",
        "department": "R&D",
        "phone": "555-0100",
        "address": "{\"city\":\"London\",\"country\":\"UK\"}"
    }))
}

#[actix_web::test]
async fn create_without_image_uses_placeholder_and_active_status() {
    let h = harness();
    let created = h.service.create(OWNER, ada(), None).await.unwrap();

    assert_eq!(created.profile_image.url, PLACEHOLDER_URL);
    assert_eq!(created.profile_image.public_id, PLACEHOLDER_ID);
    assert_eq!(created.status, EmployeeStatus::Active);
    assert_eq!(created.created_by, OWNER);
    assert!(h.media.calls().is_empty());
}

#[actix_web::test]
async fn create_with_image_uploads_before_persisting() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("ada.png")))
        .await
        .unwrap();

    assert_eq!(created.profile_image.public_id, "employees/img1");
    assert_eq!(h.media.calls(), vec![MediaCall::Upload("ada.png".into())]);
    assert_eq!(h.store.len(), 1);
}

#[actix_web::test]
async fn failed_upload_aborts_create() {
    let h = harness();
    h.media.set_fail_upload(true);

    let err = h
        .service
        .create(OWNER, ada(), Some(png("ada.png")))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Media(_)));
    assert!(h.store.is_empty());
}

#[actix_web::test]
async fn non_image_upload_is_rejected_without_side_effects() {
    let h = harness();
    let mut file = png("notes.txt");
    file.content_type = "text/plain".into();

    let err = h.service.create(OWNER, ada(), Some(file)).await.unwrap_err();

    assert!(matches!(err, ApiError::RequestRejected(_)));
    assert!(h.media.calls().is_empty());
    assert!(h.store.is_empty());
}

#[actix_web::test]
async fn update_of_department_only_leaves_everything_else() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("ada.png")))
        .await
        .unwrap();

    let updated = h
        .service
        .update(OWNER, &created.id, input(json!({"department": "X"})), None)
        .await
        .unwrap();

    assert_eq!(updated.department, "X");
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.phone, created.phone);
    assert_eq!(updated.address, created.address);
    assert_eq!(updated.profile_image, created.profile_image);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(h.media.calls().len(), 1);
}

#[actix_web::test]
async fn replacing_image_deletes_old_then_uploads_new() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("first.png")))
        .await
        .unwrap();

    let updated = h
        .service
        .update(OWNER, &created.id, EmployeeInput::default(), Some(png("second.png")))
        .await
        .unwrap();

    assert_eq!(updated.profile_image.public_id, "employees/img2");
    assert_eq!(
        h.media.calls(),
        vec![
            MediaCall::Upload("first.png".into()),
            MediaCall::Delete("employees/img1".into()),
            MediaCall::Upload("second.png".into()),
        ]
    );
}

#[actix_web::test]
async fn replacing_placeholder_never_deletes_it() {
    let h = harness();
    let created = h.service.create(OWNER, ada(), None).await.unwrap();

    h.service
        .update(OWNER, &created.id, EmployeeInput::default(), Some(png("new.png")))
        .await
        .unwrap();

    assert_eq!(h.media.calls(), vec![MediaCall::Upload("new.png".into())]);
}

#[actix_web::test]
async fn upload_failure_during_update_does_not_commit() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("first.png")))
        .await
        .unwrap();
    h.media.set_fail_upload(true);

    let err = h
        .service
        .update(
            OWNER,
            &created.id,
            input(json!({"department": "Ops"})),
            Some(png("second.png")),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Media("Error uploading profile image".into()));
    let stored = h.service.get(OWNER, &created.id).await.unwrap();
    assert_eq!(stored.department, "R&D");
    assert_eq!(stored.profile_image, created.profile_image);
}

#[actix_web::test]
async fn delete_failure_of_old_image_aborts_update_before_upload() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("first.png")))
        .await
        .unwrap();
    h.media.set_fail_delete(true);

    let err = h
        .service
        .update(OWNER, &created.id, EmployeeInput::default(), Some(png("second.png")))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Media(_)));
    assert!(!h.media.calls().contains(&MediaCall::Upload("second.png".into())));
}

#[actix_web::test]
async fn update_of_missing_id_mutates_nothing() {
    let h = harness();
    let err = h
        .service
        .update(OWNER, "missing", input(json!({"name": "Bob"})), Some(png("x.png")))
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::NotFound);
    assert!(h.store.is_empty());
    assert!(h.media.calls().is_empty());
}

#[actix_web::test]
async fn other_owners_records_look_missing() {
    let h = harness();
    let created = h.service.create(OWNER, ada(), None).await.unwrap();

    let missing_get = h.service.get(STRANGER, "does-not-exist").await.unwrap_err();
    let foreign_get = h.service.get(STRANGER, &created.id).await.unwrap_err();
    assert_eq!(missing_get, foreign_get);

    let foreign_update = h
        .service
        .update(STRANGER, &created.id, input(json!({"name": "Mallory"})), None)
        .await
        .unwrap_err();
    let foreign_delete = h.service.delete(STRANGER, &created.id).await.unwrap_err();
    assert_eq!(foreign_update, ApiError::NotFound);
    assert_eq!(foreign_delete, ApiError::NotFound);

    assert_eq!(h.service.get(OWNER, &created.id).await.unwrap().name, "Ada");
}

#[actix_web::test]
async fn delete_removes_record_and_image_then_second_delete_is_not_found() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("ada.png")))
        .await
        .unwrap();

    h.service.delete(OWNER, &created.id).await.unwrap();

    assert!(h.store.is_empty());
    assert!(h.media.calls().contains(&MediaCall::Delete("employees/img1".into())));
    assert_eq!(
        h.service.delete(OWNER, &created.id).await.unwrap_err(),
        ApiError::NotFound
    );
}

#[actix_web::test]
async fn delete_succeeds_even_when_image_removal_fails() {
    let h = harness();
    let created = h
        .service
        .create(OWNER, ada(), Some(png("ada.png")))
        .await
        .unwrap();
    h.media.set_fail_delete(true);

    h.service.delete(OWNER, &created.id).await.unwrap();
    assert!(h.store.is_empty());
}

#[actix_web::test]
async fn list_reports_pages_for_twenty_five_records() {
    let h = harness();
    for n in 0..25 {
        let mut person = ada();
        person.name = Some(format!("Person {n}"));
        h.service.create(OWNER, person, None).await.unwrap();
    }

    let page = h
        .service
        .list(OWNER, &ListQuery::new(Some(3), Some(10), None, None, None))
        .await
        .unwrap();
    assert_eq!(page.total_count, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 5);

    let beyond = h
        .service
        .list(OWNER, &ListQuery::new(Some(9), Some(10), None, None, None))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
}

/// Store whose writes always fail.
struct BrokenStore;

#[async_trait]
impl EmployeeRepository for BrokenStore {
    async fn insert(&self, _new: NewEmployee) -> anyhow::Result<Employee> {
        Err(anyhow!("disk full"))
    }

    async fn find(&self, _owner: u64, _id: &str) -> anyhow::Result<Option<Employee>> {
        Err(anyhow!("connection reset"))
    }

    async fn list(&self, _owner: u64, _query: &ListQuery) -> anyhow::Result<EmployeePage> {
        Err(anyhow!("connection reset"))
    }

    async fn update(
        &self,
        _owner: u64,
        _id: &str,
        _patch: &EmployeePatch,
    ) -> anyhow::Result<Option<Employee>> {
        Err(anyhow!("connection reset"))
    }

    async fn delete(&self, _owner: u64, _id: &str) -> anyhow::Result<bool> {
        Err(anyhow!("connection reset"))
    }
}

#[actix_web::test]
async fn storage_failure_after_upload_discards_the_upload() {
    let media = Arc::new(FakeMedia::default());
    let service = EmployeeService::new(Arc::new(BrokenStore), media.clone(), placeholder());

    let err = service
        .create(OWNER, ada(), Some(png("ada.png")))
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Storage("Server error while creating employee".into()));
    assert_eq!(
        media.calls(),
        vec![
            MediaCall::Upload("ada.png".into()),
            MediaCall::Delete("employees/img1".into()),
        ]
    );
}

#[actix_web::test]
async fn storage_failure_on_read_is_a_storage_error() {
    let media = Arc::new(FakeMedia::default());
    let service = EmployeeService::new(Arc::new(BrokenStore), media, placeholder());

    assert!(matches!(
        service.get(OWNER, "any").await.unwrap_err(),
        ApiError::Storage(_)
    ));
    assert!(matches!(
        service.list(OWNER, &ListQuery::default()).await.unwrap_err(),
        ApiError::Storage(_)
    ));
}
