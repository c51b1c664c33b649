//! Enrollment protocol across the graph and document stores.

use std::sync::Arc;

use async_trait::async_trait;
use edu_core::entities::{GraphNode, NewCourse, UserProfile};
use edu_core::enums::{AuditAction, Role};
use edu_db::coordinator::EnrollmentCoordinator;
use edu_db::documents::CourseStore;
use edu_db::error::{DatabaseError, ServiceError};
use edu_db::graph::{GraphStore, LibsqlGraphStore, Mutation, MutationResult, Pattern};
use edu_db::test_support::{RecordingAuditSink, TestHarness};
use pretty_assertions::assert_eq;

async fn harness() -> TestHarness {
    TestHarness::new().await.unwrap()
}

async fn course_keys_for(h: &TestHarness, user_id: &str) -> Vec<String> {
    h.coordinator
        .list_enrollments_for_user(user_id)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.course_id)
        .collect()
}

async fn student_keys_for(h: &TestHarness, course_id: &str) -> Vec<String> {
    h.coordinator
        .list_students_for_course(course_id)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.user_id)
        .collect()
}

async fn set_count(h: &TestHarness, course_id: &str, value: u32) {
    assert!(h.courses.set_enrolled_count(course_id, value).await.unwrap());
}

#[tokio::test]
async fn enroll_twice_counts_once() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();

    let first = h.coordinator.enroll("s1", &course.id).await.unwrap();
    let second = h.coordinator.enroll("s1", &course.id).await.unwrap();

    assert!(first.enrolled && !first.already_enrolled);
    assert!(!second.enrolled && second.already_enrolled);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
    assert_eq!(h.audit.records().await.len(), 1);
}

#[tokio::test]
async fn unenroll_never_enrolled_is_a_noop() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s2", &course.id).await.unwrap();

    let result = h.coordinator.unenroll("s1", &course.id).await.unwrap();

    assert!(!result.unenrolled);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
    // Read-only resolution: no User node was created for s1.
    assert!(h.graph.query(&Pattern::user("s1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn unenroll_unknown_course_creates_nothing() {
    let h = harness().await;
    let result = h.coordinator.unenroll("s1", "c-nowhere").await.unwrap();
    assert!(!result.unenrolled);
    assert!(h.graph.query(&Pattern::course("c-nowhere")).await.unwrap().is_empty());
    assert!(h.audit.records().await.is_empty());
}

#[tokio::test]
async fn repeated_unenroll_never_drives_counter_below_zero() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1", &course.id).await.unwrap();

    for _ in 0..4 {
        h.coordinator.unenroll("s1", &course.id).await.unwrap();
    }
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(0));
}

#[tokio::test]
async fn counter_floor_holds_even_when_already_drifted() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1", &course.id).await.unwrap();
    set_count(&h, &course.id, 0).await;

    let result = h.coordinator.unenroll("s1", &course.id).await.unwrap();

    assert!(result.unenrolled);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(0));
    let records = h.audit.records().await;
    assert_eq!(records.last().unwrap().params["counter"], "unchanged");
}

#[tokio::test]
async fn cascade_removes_node_and_every_edge() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1", &course.id).await.unwrap();
    h.coordinator.enroll("s2", &course.id).await.unwrap();
    h.coordinator.enroll("s2", "other").await.unwrap();

    let result = h.coordinator.cascade_delete_course(&course.id).await.unwrap();

    assert!(result.node_removed);
    assert_eq!(result.edges_removed, 2);
    assert!(student_keys_for(&h, &course.id).await.is_empty());
    assert!(h.graph.query(&Pattern::course(&course.id)).await.unwrap().is_empty());
    assert_eq!(course_keys_for(&h, "s2").await, vec!["other"]);
}

#[tokio::test]
async fn cascade_without_graph_presence_is_not_an_error() {
    let h = harness().await;
    let result = h.coordinator.cascade_delete_course("c-ghost").await.unwrap();
    assert!(!result.node_removed);
    assert_eq!(result.edges_removed, 0);
}

#[tokio::test]
async fn creating_a_course_auto_enrolls_the_teacher_without_counting() {
    let h = harness().await;
    let course = h
        .lifecycle
        .create_course(&NewCourse {
            course_name: "Compilers".into(),
            taught_by: "t@x.edu".into(),
        })
        .await
        .unwrap();

    assert_eq!(course_keys_for(&h, "t@x.edu").await, vec![course.id.clone()]);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(0));
    assert!(h.audit.records().await.is_empty());
}

#[tokio::test]
async fn end_to_end_scenario() {
    let h = harness().await;
    let c1 = h.seed_course("c1", "t@x.edu").await.unwrap().id;

    let r = h.coordinator.enroll("s1", &c1).await.unwrap();
    assert!(r.enrolled);
    assert_eq!(h.enrolled_count(&c1).await.unwrap(), Some(1));
    assert_eq!(student_keys_for(&h, &c1).await, vec!["s1"]);

    let r = h.coordinator.enroll("s1", &c1).await.unwrap();
    assert!(r.already_enrolled);
    assert_eq!(h.enrolled_count(&c1).await.unwrap(), Some(1));

    let r = h.coordinator.unenroll("s1", &c1).await.unwrap();
    assert!(r.unenrolled);
    assert_eq!(h.enrolled_count(&c1).await.unwrap(), Some(0));
    assert!(student_keys_for(&h, &c1).await.is_empty());

    let r = h.coordinator.unenroll("s1", &c1).await.unwrap();
    assert!(!r.unenrolled);
    assert_eq!(h.enrolled_count(&c1).await.unwrap(), Some(0));

    let actions: Vec<AuditAction> = h
        .audit
        .records()
        .await
        .into_iter()
        .map(|r| r.action)
        .collect();
    assert_eq!(
        actions,
        vec![AuditAction::EnrolledIn, AuditAction::UnenrolledFrom]
    );
}

#[tokio::test]
async fn concurrent_first_enrolls_count_once() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();

    let (a, b) = tokio::join!(
        h.coordinator.enroll("s1", &course.id),
        h.coordinator.enroll("s1", &course.id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.enrolled ^ b.enrolled, "exactly one call enrolls");
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
    assert_eq!(student_keys_for(&h, &course.id).await, vec!["s1"]);
}

#[tokio::test]
async fn concurrent_unenrolls_decrement_once() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1", &course.id).await.unwrap();
    h.coordinator.enroll("s2", &course.id).await.unwrap();

    let (a, b) = tokio::join!(
        h.coordinator.unenroll("s1", &course.id),
        h.coordinator.unenroll("s1", &course.id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.unenrolled ^ b.unenrolled);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
}

#[tokio::test]
async fn counter_failure_is_a_partial_write_repaired_by_reconcile() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();

    h.courses.fail_counter_updates(true);
    let err = h.coordinator.enroll("s1", &course.id).await.unwrap_err();
    h.courses.fail_counter_updates(false);

    assert!(err.is_partial_write());
    assert!(matches!(
        err,
        ServiceError::PartialWrite { action: AuditAction::EnrolledIn, .. }
    ));
    // Edge persisted, counter under-counts.
    assert_eq!(student_keys_for(&h, &course.id).await, vec!["s1"]);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(0));
    let records = h.audit.records().await;
    assert_eq!(records[0].params["counter"], "failed");

    // A retry sees the edge and does not double count.
    let again = h.coordinator.enroll("s1", &course.id).await.unwrap();
    assert!(again.already_enrolled);

    let report = h.reconciler.reconcile_course(&course.id).await.unwrap();
    assert_eq!(report.recorded, 0);
    assert_eq!(report.actual, 1);
    assert_eq!(report.drift, 1);
    assert!(report.corrected);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
}

#[tokio::test]
async fn audit_failure_never_fails_the_enrollment() {
    let h = TestHarness::with_audit(RecordingAuditSink::failing())
        .await
        .unwrap();
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();

    assert!(h.coordinator.enroll("s1", &course.id).await.unwrap().enrolled);
    assert!(h.coordinator.unenroll("s1", &course.id).await.unwrap().unenrolled);
    assert!(h.audit.records().await.is_empty());
}

#[tokio::test]
async fn audit_record_carries_actor_and_params() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1@x.edu", &course.id).await.unwrap();

    let records = h.audit.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.actor, "s1@x.edu");
    assert_eq!(record.action, AuditAction::EnrolledIn);
    assert_eq!(record.params["course_id"], course.id.as_str());
    assert_eq!(record.params["counter"], "applied");
    assert!(record.params["user_uid"].as_str().unwrap().starts_with("usr-"));
}

#[tokio::test]
async fn enroll_without_course_document_still_succeeds() {
    let h = harness().await;

    let result = h.coordinator.enroll("s1", "c-no-doc").await.unwrap();

    assert!(result.enrolled);
    let rows = h
        .coordinator
        .list_enrollments_for_user("s1")
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].course_id, "c-no-doc");
    assert_eq!(rows[0].course_name, None);
    assert_eq!(h.audit.records().await[0].params["counter"], "unchanged");
}

#[tokio::test]
async fn listings_join_display_attributes() {
    let h = harness().await;
    let course = h.seed_course("Operating Systems", "t@x.edu").await.unwrap();
    h.coordinator
        .resolver()
        .register_user(&UserProfile {
            user_id: "s1@x.edu".into(),
            full_name: "Linus".into(),
            role: Role::Student,
        })
        .await
        .unwrap();
    h.coordinator.enroll("s1@x.edu", &course.id).await.unwrap();

    let mine = h
        .coordinator
        .list_enrollments_for_user("s1@x.edu")
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(mine[0].course_name.as_deref(), Some("Operating Systems"));

    let mut students = h
        .coordinator
        .list_students_for_course(&course.id)
        .await
        .unwrap();
    assert_eq!(students.len(), 1);
    let row = students.next().await.unwrap().unwrap();
    assert_eq!(row.user_id, "s1@x.edu");
    assert_eq!(row.user_name.as_deref(), Some("Linus"));
    assert_eq!(row.course_name.as_deref(), Some("Operating Systems"));
    assert!(students.next().await.unwrap().is_none());

    students.rewind();
    assert!(students.next().await.unwrap().is_some());
}

#[tokio::test]
async fn blank_identifiers_are_validation_errors() {
    let h = harness().await;
    assert!(matches!(
        h.coordinator.enroll("", "c1").await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        h.coordinator.unenroll("s1", "  ").await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        h.coordinator.list_students_for_course("").await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn reconcile_excludes_the_teacher_edge() {
    let h = harness().await;
    let course = h
        .lifecycle
        .create_course(&NewCourse {
            course_name: "Graphs".into(),
            taught_by: "t@x.edu".into(),
        })
        .await
        .unwrap();
    h.coordinator.enroll("s1", &course.id).await.unwrap();
    h.coordinator.enroll("s2", &course.id).await.unwrap();

    let clean = h.reconciler.reconcile_course(&course.id).await.unwrap();
    assert_eq!(clean.actual, 2);
    assert!(!clean.has_drift());
    assert!(!clean.corrected);

    set_count(&h, &course.id, 5).await;
    let drifted = h.reconciler.reconcile_course(&course.id).await.unwrap();
    assert_eq!(drifted.drift, -3);
    assert!(drifted.corrected);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(2));
}

#[tokio::test]
async fn teacher_enrolling_after_failed_auto_enroll_is_not_counted() {
    let h = harness().await;
    // No teacher edge, as if auto-enrollment had failed.
    let course = h.seed_course("Networks", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1", &course.id).await.unwrap();

    let teacher = h.coordinator.enroll("t@x.edu", &course.id).await.unwrap();
    assert!(teacher.enrolled);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
    let records = h.audit.records().await;
    assert_eq!(records.last().unwrap().params["counter"], "exempt");

    let report = h.reconciler.reconcile_course(&course.id).await.unwrap();
    assert_eq!(report.recorded, 1);
    assert_eq!(report.actual, 1);
    assert!(!report.has_drift());
    assert!(!report.corrected);

    let left = h.coordinator.unenroll("t@x.edu", &course.id).await.unwrap();
    assert!(left.unenrolled);
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(1));
    assert!(!h.reconciler.reconcile_course(&course.id).await.unwrap().has_drift());
}

/// Deletes the watched course node right before any edge write goes through.
struct CourseDeletedBeforeEdgeWrite {
    inner: Arc<LibsqlGraphStore>,
    course_id: String,
}

#[async_trait]
impl GraphStore for CourseDeletedBeforeEdgeWrite {
    async fn query(&self, pattern: &Pattern) -> Result<Vec<GraphNode>, DatabaseError> {
        self.inner.query(pattern).await
    }

    async fn mutate(&self, mutation: Mutation) -> Result<MutationResult, DatabaseError> {
        if !mutation.set_edges.is_empty() {
            for node in self.inner.query(&Pattern::course(&self.course_id)).await? {
                self.inner.mutate(Mutation::new().delete_node(node.uid)).await?;
            }
        }
        self.inner.mutate(mutation).await
    }
}

#[tokio::test]
async fn enroll_losing_to_course_delete_writes_no_edge() {
    let h = harness().await;
    let course = h.seed_course("Rust", "t@x.edu").await.unwrap();
    let racing = EnrollmentCoordinator::new(
        Arc::new(CourseDeletedBeforeEdgeWrite {
            inner: h.graph.clone(),
            course_id: course.id.clone(),
        }),
        h.courses.clone(),
        h.audit.clone(),
    );

    let result = racing.enroll("s1", &course.id).await;

    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(h.enrolled_count(&course.id).await.unwrap(), Some(0));
    assert!(h.audit.records().await.is_empty());
    assert!(course_keys_for(&h, "s1").await.is_empty());
    let mut rows = h
        .graph
        .db()
        .conn()
        .query("SELECT COUNT(*) FROM graph_edges", ())
        .await
        .unwrap();
    let row = rows.next().await.unwrap().unwrap();
    assert_eq!(row.get::<i64>(0).unwrap(), 0);
}

#[tokio::test]
async fn reconcile_missing_course_is_not_found() {
    let h = harness().await;
    assert!(matches!(
        h.reconciler.reconcile_course("cou-missing").await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn reconcile_all_reports_every_course() {
    let h = harness().await;
    let a = h.seed_course("A", "t@x.edu").await.unwrap();
    let b = h.seed_course("B", "t@x.edu").await.unwrap();
    h.coordinator.enroll("s1", &a.id).await.unwrap();
    set_count(&h, &b.id, 2).await;

    let reports = h.reconciler.reconcile_all().await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports.iter().filter(|r| r.has_drift()).count(), 1);
    assert_eq!(h.enrolled_count(&b.id).await.unwrap(), Some(0));
}
