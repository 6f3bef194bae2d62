use annals_core::StagedFile;
use annals_crm::schema::fields;
use annals_crm::{
    CrmApi, CrmError, MemoryCrm, ModuleNames, Operation, Page, Record, RelatedLists, Search,
};
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().expect("object")
}

fn history_crm() -> MemoryCrm {
    MemoryCrm::with_history_schema(&ModuleNames::default(), &RelatedLists::default())
}

#[tokio::test]
async fn insert_fills_lookup_names_and_related_lists_follow_lookups() {
    let crm = history_crm();
    crm.seed(
        "Contacts",
        record(json!({"id": "c1", "Full_Name": "Ada Lovelace"})),
    );

    let history = crm
        .insert_record("History1", record(json!({"Name": "Ada Lovelace"})), &[])
        .await
        .expect("insert history");
    assert!(history.is_success());
    let history_id = history.id.expect("history id");

    let join = crm
        .insert_record(
            "History_X_Contacts",
            record(json!({
                "Contact_Details": {"id": "c1"},
                "Contact_History_Info": {"id": history_id}
            })),
            &[],
        )
        .await
        .expect("insert join");
    assert!(join.is_success());

    let by_contact = crm
        .get_related_records("Contacts", "c1", "History3", &fields::JOIN_FIELDS, Page::default())
        .await
        .expect("related by contact");
    assert_eq!(by_contact.len(), 1);
    assert_eq!(
        by_contact[0]["Contact_History_Info"]["name"],
        json!("Ada Lovelace")
    );

    let by_history = crm
        .get_related_records(
            "History1",
            &history_id,
            "Contacts3",
            &fields::JOIN_FIELDS,
            Page::default(),
        )
        .await
        .expect("related by history");
    assert_eq!(by_history[0]["Contact_Details"]["name"], json!("Ada Lovelace"));
}

#[tokio::test]
async fn injected_write_failure_is_an_error_outcome() {
    let crm = history_crm();
    crm.fail_times(Operation::Insert, Some("History1"), 1);

    let first = crm
        .insert_record("History1", Record::new(), &[])
        .await
        .expect("outcome");
    assert!(!first.is_success());
    assert!(crm.records("History1").is_empty());

    let second = crm
        .insert_record("History1", Record::new(), &[])
        .await
        .expect("outcome");
    assert!(second.is_success());
    assert_eq!(crm.count(Operation::Insert, "History1"), 2);
}

#[tokio::test]
async fn injected_read_failure_is_an_error() {
    let crm = history_crm();
    crm.fail(Operation::Related, None);
    let err = crm
        .get_related_records("Contacts", "c1", "History3", &[], Page::default())
        .await
        .expect_err("related should fail");
    assert!(matches!(err, CrmError::Unavailable(_)));
}

#[tokio::test]
async fn delete_removes_record_attachments() {
    let crm = history_crm();
    let id = crm.seed("History1", record(json!({"Name": "x"})));
    let file = StagedFile::new("notes.pdf", b"pdf".to_vec()).expect("file");
    let upload = crm
        .upload_attachment("History1", &id, &file)
        .await
        .expect("upload");
    assert!(upload.is_success());
    assert_eq!(crm.attachments("History1", &id).len(), 1);

    let deleted = crm.delete_record("History1", &id).await.expect("delete");
    assert!(deleted.is_success());
    assert!(crm.attachments("History1", &id).is_empty());

    let again = crm.delete_record("History1", &id).await.expect("delete");
    assert!(!again.is_success());
}

#[tokio::test]
async fn search_supports_criteria_email_and_word() {
    let crm = history_crm();
    crm.seed(
        "Contacts",
        record(json!({"id": "c1", "Full_Name": "Ada Lovelace", "Last_Name": "Lovelace", "Email": "ada@example.com"})),
    );
    crm.seed(
        "Contacts",
        record(json!({"id": "c2", "Full_Name": "Grace Hopper", "Last_Name": "Hopper"})),
    );

    let by_name = crm
        .search_records("Contacts", &Search::equals("Last_Name", "hopper"), Page::default())
        .await
        .expect("search");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0]["id"], json!("c2"));

    let by_email = crm
        .search_records(
            "Contacts",
            &Search::Email("ada@example.com".to_string()),
            Page::default(),
        )
        .await
        .expect("search");
    assert_eq!(by_email[0]["id"], json!("c1"));

    let by_word = crm
        .search_records("Contacts", &Search::Word("grace".to_string()), Page::default())
        .await
        .expect("search");
    assert_eq!(by_word.len(), 1);
}
