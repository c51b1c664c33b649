//! `EduService` over file-backed stores built from configuration.

use edu_config::{AuditSinkKind, EduConfig};
use edu_core::entities::NewCourse;
use edu_core::enums::AuditAction;
use edu_db::audit::AuditFilter;
use edu_db::service::EduService;
use pretty_assertions::assert_eq;

fn config_in(dir: &std::path::Path, sink: AuditSinkKind) -> EduConfig {
    let mut config = EduConfig::default();
    config.graph.path = dir.join("graph.db").to_string_lossy().into_owned();
    config.documents.path = dir.join("documents.db").to_string_lossy().into_owned();
    config.audit.path = dir.join("audit.db").to_string_lossy().into_owned();
    config.audit.trail_dir = dir.join("audit").to_string_lossy().into_owned();
    config.audit.sink = sink;
    config
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), AuditSinkKind::Database);

    let course_id = {
        let service = EduService::open(&config).await.unwrap();
        let course = service
            .lifecycle()
            .create_course(&NewCourse {
                course_name: "Rust".into(),
                taught_by: "t@x.edu".into(),
            })
            .await
            .unwrap();
        service.coordinator().enroll("s1", &course.id).await.unwrap();
        course.id
    };

    let service = EduService::open(&config).await.unwrap();
    let course = service.lifecycle().get_course(&course_id).await.unwrap();
    assert_eq!(course.enrolled_count, 1);
    let students = service
        .coordinator()
        .list_students_for_course(&course_id)
        .await
        .unwrap();
    assert_eq!(students.len(), 2, "student plus auto-enrolled teacher");

    let audit = service.query_audit(&AuditFilter::default()).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::EnrolledIn);
}

#[tokio::test]
async fn jsonl_sink_is_queryable() {
    let dir = tempfile::tempdir().unwrap();
    let service = EduService::open(&config_in(dir.path(), AuditSinkKind::Jsonl))
        .await
        .unwrap();

    service.coordinator().enroll("s1", "c1").await.unwrap();
    service.coordinator().unenroll("s1", "c1").await.unwrap();

    let records = service.query_audit(&AuditFilter::default()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, AuditAction::UnenrolledFrom);
    assert!(dir.path().join("audit").is_dir());
    assert!(!dir.path().join("audit.db").exists());
}

#[tokio::test]
async fn disabled_sink_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let service = EduService::open(&config_in(dir.path(), AuditSinkKind::Disabled))
        .await
        .unwrap();

    assert!(service.coordinator().enroll("s1", "c1").await.unwrap().enrolled);
    assert!(service
        .query_audit(&AuditFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn in_memory_service_wires_every_component() {
    let service = EduService::in_memory().await.unwrap();
    let course = service
        .lifecycle()
        .create_course(&NewCourse {
            course_name: "Go".into(),
            taught_by: "t@x.edu".into(),
        })
        .await
        .unwrap();
    service.coordinator().enroll("s1", &course.id).await.unwrap();

    let report = service.reconciler().reconcile_course(&course.id).await.unwrap();
    assert!(!report.has_drift());
    assert!(service.resolver().lookup_user("t@x.edu").await.unwrap().is_some());
    assert_eq!(
        service
            .query_audit(&AuditFilter {
                actor: Some("s1".into()),
                ..AuditFilter::default()
            })
            .await
            .unwrap()
            .len(),
        1
    );
}
