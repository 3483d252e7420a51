use chrono::NaiveDate;
use progress_core::model::{AuthUser, ClassId, ClassRecord, Role, StudentEmail, StudentRecord};
use progress_core::policy::ProgressPolicy;
use storage::repository::{
    AuthRepository, ClassRepository, KeyValueStore, Storage, StudentRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_persists_student_record() {
    let repo = connect("memdb_student_roundtrip").await;

    let email = StudentEmail::parse("Grace@Example.com").unwrap();
    let mut record = StudentRecord::new(email.clone(), "Grace", &ProgressPolicy::default());
    record.streak = 3;
    record.topics[1].progress = 42;
    record.last_session_date = NaiveDate::from_ymd_opt(2024, 2, 29);
    let record = record.normalized();

    repo.put_student(&record).await.unwrap();

    let raw = repo
        .get("student_data_grace@example.com")
        .await
        .unwrap()
        .expect("stored under lowercased key");
    assert!(raw.contains("\"lastSessionDate\":\"2024-02-29\""));

    let fetched = repo.get_student(&email).await.unwrap().expect("record");
    assert_eq!(fetched, record);
    assert_eq!(fetched.overall_progress, 14);
}

#[tokio::test]
async fn sqlite_put_replaces_existing_value() {
    let repo = connect("memdb_replace").await;

    let mut class = ClassRecord::new(ClassId::new("class-a"), "Class A");
    repo.put_class(&class).await.unwrap();
    class.add_student(StudentEmail::parse("a@x.io").unwrap());
    repo.put_class(&class).await.unwrap();

    let fetched = repo.get_class(&class.id).await.unwrap().unwrap();
    assert_eq!(fetched.student_emails.len(), 1);
    assert_eq!(
        repo.keys_with_prefix("class_data_").await.unwrap(),
        vec!["class_data_class-a".to_string()]
    );
}

#[tokio::test]
async fn sqlite_prefix_scan_and_remove() {
    let repo = connect("memdb_prefix").await;
    let policy = ProgressPolicy::default();

    for raw in ["zed@x.io", "amy@x.io"] {
        let record = StudentRecord::new(StudentEmail::parse(raw).unwrap(), raw, &policy);
        repo.put_student(&record).await.unwrap();
    }
    let user = AuthUser {
        name: "Amy".into(),
        email: StudentEmail::parse("amy@x.io").unwrap(),
        role: Role::Student,
    };
    repo.put_auth_user(&user).await.unwrap();

    let listed = repo.list_students().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].email.as_str(), "amy@x.io");

    repo.clear_auth_user().await.unwrap();
    assert!(repo.get("auth_user").await.unwrap().is_none());
    assert_eq!(repo.list_students().await.unwrap().len(), 2);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_wires_all_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_wiring?mode=memory&cache=shared")
        .await
        .expect("storage");

    let class = ClassRecord::new(ClassId::new("b"), "Class b");
    storage.classes.put_class(&class).await.unwrap();
    assert!(storage.kv.get("class_data_b").await.unwrap().is_some());
    assert!(storage.auth.get_auth_user().await.unwrap().is_none());
}
